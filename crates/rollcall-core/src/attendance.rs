//! Attendance log entries, intents, and the wire shapes built from them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Status written when a check-in opens an entry.
pub const STATUS_CHECKED_IN: &str = "checked-in";
/// Status written when a check-out closes an entry.
pub const STATUS_CHECKED_OUT: &str = "checked-out";

// ─── Intents ─────────────────────────────────────────────────────────────────

/// Which transition a kiosk wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  In,
  Out,
}

impl Direction {
  pub fn toggled(self) -> Self {
    match self {
      Self::In => Self::Out,
      Self::Out => Self::In,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::In => "in",
      Self::Out => "out",
    }
  }
}

/// A requested transition, not yet validated against server state.
///
/// Serialises as the `POST /api/attendance` body: `{"name":..,"type":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceIntent {
  #[serde(rename = "name")]
  pub label:     String,
  #[serde(rename = "type")]
  pub direction: Direction,
}

/// Reply body shared by every mutating endpoint. Callers branch on `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
  pub success: bool,
  pub message: String,
}

impl Reply {
  pub fn ok(message: impl Into<String>) -> Self {
    Self { success: true, message: message.into() }
  }

  pub fn rejected(message: impl Into<String>) -> Self {
    Self { success: false, message: message.into() }
  }
}

// ─── Log entries ─────────────────────────────────────────────────────────────

/// One shift segment. `check_out_time == None` marks the entry as open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub id:             i64,
  pub subject_id:     i64,
  pub check_in_time:  DateTime<Utc>,
  pub check_out_time: Option<DateTime<Utc>>,
  pub status:         String,
}

impl LogEntry {
  pub fn is_open(&self) -> bool { self.check_out_time.is_none() }
}

/// A log entry joined with its subject, as returned by `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
  pub id:             i64,
  pub user_id:        i64,
  pub username:       String,
  pub department:     Option<String>,
  pub check_in_time:  DateTime<Utc>,
  pub check_out_time: Option<DateTime<Utc>>,
  pub status:         String,
}

/// A subject currently on shift, as returned by `GET /api/current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnShift {
  pub username:      String,
  pub department:    Option<String>,
  pub check_in_time: DateTime<Utc>,
}

// ─── Admin edits ─────────────────────────────────────────────────────────────

/// A single-field correction to an existing log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEdit {
  Status(String),
  CheckIn(DateTime<Utc>),
  /// `None` reopens the entry.
  CheckOut(Option<DateTime<Utc>>),
}

impl LogEdit {
  /// Interpret the `{type, value}` pair of `PUT /api/logs/:id`.
  ///
  /// Returns `Ok(None)` when `kind` is not a recognised field name.
  pub fn parse(kind: &str, value: Option<&str>) -> Result<Option<Self>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let edit = match kind {
      "status" => Self::Status(value.ok_or(Error::EmptyStatus)?.to_owned()),
      "time" => Self::CheckIn(parse_timestamp(value.unwrap_or_default())?),
      "out_time" => Self::CheckOut(value.map(parse_timestamp).transpose()?),
      _ => return Ok(None),
    };
    Ok(Some(edit))
  }
}

/// Parse an admin-supplied timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, and the `YYYY-MM-DDTHH:MM` form
/// produced by HTML `datetime-local` inputs. Naive values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::InvalidTimestamp(raw.to_owned()))
}
