//! Subject — a person enrolled for recognition and attendance tracking.
//!
//! The label is the matching key shared with the face recognizer, so it is
//! unique across the roster. Reference descriptors are not stored here: the
//! kiosk derives them from the enrollment photo when it loads its roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Label the matcher assigns to a face that matches no enrolled subject.
pub const UNKNOWN_LABEL: &str = "unknown";

const MAX_LABEL_CHARS: usize = 64;

/// A persisted roster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:         i64,
  pub label:      String,
  pub department: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input for enrolling a subject. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub label:      String,
  pub department: Option<String>,
}

impl NewSubject {
  /// Build an enrollment request, trimming the label and dropping a blank
  /// department. Fails if the label is not usable as a matching key.
  pub fn new(label: &str, department: Option<&str>) -> Result<Self> {
    let label = validate_label(label)?.to_owned();
    let department = department
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .map(str::to_owned);
    Ok(Self { label, department })
  }
}

/// Roster row as returned by `GET /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  pub id:         i64,
  pub username:   String,
  pub department: Option<String>,
}

impl From<Subject> for RosterEntry {
  fn from(s: Subject) -> Self {
    Self { id: s.id, username: s.label, department: s.department }
  }
}

/// Check that `label` can serve as both a matching key and a photo file stem.
///
/// Returns the trimmed label.
pub fn validate_label(label: &str) -> Result<&str> {
  let trimmed = label.trim();
  let reject = |reason| Error::InvalidLabel { label: label.to_owned(), reason };

  if trimmed.is_empty() {
    return Err(reject("label is empty"));
  }
  if trimmed.chars().count() > MAX_LABEL_CHARS {
    return Err(reject("label is longer than 64 characters"));
  }
  if trimmed.eq_ignore_ascii_case(UNKNOWN_LABEL) {
    return Err(reject("label is reserved"));
  }
  if trimmed.contains(|c| c == '/' || c == '\\') || trimmed.contains("..") {
    return Err(reject("label must not contain path separators"));
  }
  if trimmed.chars().any(char::is_control) {
    return Err(reject("label must not contain control characters"));
  }
  Ok(trimmed)
}
