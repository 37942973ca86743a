//! Delivery of attendance intents to the server.

use std::future::Future;

use rollcall_core::attendance::{AttendanceIntent, Reply};

/// What became of one reported intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The server decided. `reply.success` says which way.
  Adjudicated(Reply),
  /// No decision was obtained; the intent may be retried immediately.
  TransportFailed(String),
}

pub trait Reporter: Send + Sync + 'static {
  fn report(&self, intent: AttendanceIntent) -> impl Future<Output = Outcome> + Send;
}
