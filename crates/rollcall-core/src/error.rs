//! Error types for `rollcall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(i64),

  #[error("log entry not found: {0}")]
  LogNotFound(i64),

  #[error("a subject named {0:?} is already enrolled")]
  DuplicateLabel(String),

  #[error("invalid label {label:?}: {reason}")]
  InvalidLabel { label: String, reason: &'static str },

  #[error("invalid timestamp {0:?}")]
  InvalidTimestamp(String),

  #[error("check-out time must not precede check-in time")]
  InvalidTimeRange,

  #[error("subject {0} already has an open log entry")]
  ShiftConflict(i64),

  #[error("status must not be empty")]
  EmptyStatus,
}

impl Error {
  /// `true` for violations of a business rule, as opposed to a missing row
  /// or malformed input.
  pub fn is_rejection(&self) -> bool {
    matches!(
      self,
      Self::DuplicateLabel(_)
        | Self::InvalidLabel { .. }
        | Self::InvalidTimeRange
        | Self::ShiftConflict(_)
    )
  }
}

/// Implemented by backend errors that may carry a domain rule violation.
///
/// Lets higher layers classify a store failure without knowing the concrete
/// backend error type.
pub trait DomainError {
  fn as_domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
