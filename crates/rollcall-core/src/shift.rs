//! The attendance state machine.
//!
//! A subject is `OffShift` when it has no open log entry and `OnShift` when
//! it has exactly one. The kiosk's mode only says which transition it
//! *intends*; [`decide`] is the authority on whether that transition applies.
//!
//! ```text
//!              in                      out
//!  OffShift ────────▶ OnShift   OnShift ────────▶ OffShift
//!  OffShift ── out ─▶ Reject(NotCheckedIn)
//!  OnShift  ── in  ─▶ Reject(AlreadyOnShift)
//! ```
//!
//! The decision is pure. Stores must read the state and apply the resulting
//! [`Step`] atomically with respect to other intents for the same subject.

use crate::{
  attendance::{Direction, LogEntry},
  subject::Subject,
};

/// The authoritative shift state of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftState {
  OffShift,
  OnShift { open_log_id: i64 },
}

/// Why an intent was refused. No mutation accompanies a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  UnknownSubject,
  AlreadyOnShift,
  NotCheckedIn,
}

/// What the store must do to honour an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  /// Insert a new entry with check-in = now and no check-out.
  Open,
  /// Set check-out = now on the given open entry.
  Close { log_id: i64 },
  Reject(Rejection),
}

/// Decide the transition for `direction` given the subject's current state.
pub fn decide(state: &ShiftState, direction: Direction) -> Step {
  match (state, direction) {
    (ShiftState::OffShift, Direction::In) => Step::Open,
    (ShiftState::OnShift { .. }, Direction::In) => {
      Step::Reject(Rejection::AlreadyOnShift)
    }
    (ShiftState::OnShift { open_log_id }, Direction::Out) => {
      Step::Close { log_id: *open_log_id }
    }
    (ShiftState::OffShift, Direction::Out) => {
      Step::Reject(Rejection::NotCheckedIn)
    }
  }
}

/// The applied result of an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  CheckedIn { subject: Subject, entry: LogEntry },
  CheckedOut { subject: Subject, entry: LogEntry },
  Rejected { label: String, reason: Rejection },
}

impl Transition {
  pub fn is_success(&self) -> bool { !matches!(self, Self::Rejected { .. }) }

  /// Human-readable outcome for the kiosk operator.
  pub fn message(&self) -> String {
    match self {
      Self::CheckedIn { subject, .. } => {
        format!("Welcome, {}! Checked in.", subject.label)
      }
      Self::CheckedOut { subject, .. } => {
        format!("Goodbye, {}! Checked out.", subject.label)
      }
      Self::Rejected { label, reason: Rejection::AlreadyOnShift } => {
        format!("{label} is already on shift")
      }
      Self::Rejected { label, reason: Rejection::NotCheckedIn } => {
        format!("{label} is not checked in")
      }
      Self::Rejected { label, reason: Rejection::UnknownSubject } => {
        format!("subject not found: {label}")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_state_and_direction() {
    let on = ShiftState::OnShift { open_log_id: 7 };
    assert_eq!(decide(&ShiftState::OffShift, Direction::In), Step::Open);
    assert_eq!(decide(&on, Direction::Out), Step::Close { log_id: 7 });
    assert_eq!(
      decide(&on, Direction::In),
      Step::Reject(Rejection::AlreadyOnShift)
    );
    assert_eq!(
      decide(&ShiftState::OffShift, Direction::Out),
      Step::Reject(Rejection::NotCheckedIn)
    );
  }

  #[test]
  fn rejection_messages_name_the_subject() {
    let t = Transition::Rejected {
      label:  "Kim".into(),
      reason: Rejection::AlreadyOnShift,
    };
    assert!(!t.is_success());
    assert!(t.message().contains("already"));
    assert!(t.message().contains("Kim"));
  }
}
