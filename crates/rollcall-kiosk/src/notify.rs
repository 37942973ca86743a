//! Operator feedback.

/// A message for the person standing at the kiosk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
  /// The server accepted the transition.
  Success(String),
  /// The server adjudicated and said no (already on shift, not checked in...).
  Rejected(String),
  /// Nothing was decided: network trouble, server fault, camera error.
  Failure(String),
}

impl Toast {
  pub fn message(&self) -> &str {
    match self {
      Self::Success(m) | Self::Rejected(m) | Self::Failure(m) => m,
    }
  }
}

pub trait Notifier: Send {
  fn notify(&self, toast: Toast);
}

/// Writes toasts to stdout and the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn notify(&self, toast: Toast) {
    match &toast {
      Toast::Success(m) => {
        tracing::info!(text = %m, "attendance recorded");
        println!("✅ {m}");
      }
      Toast::Rejected(m) => {
        tracing::info!(text = %m, "attendance rejected");
        println!("⚠️  {m}");
      }
      Toast::Failure(m) => {
        tracing::warn!(text = %m, "kiosk failure");
        println!("❌ {m}");
      }
    }
  }
}
