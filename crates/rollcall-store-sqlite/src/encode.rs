//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 with a fixed six-digit fraction and a
//! `Z` suffix, so string order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use rollcall_core::{
  attendance::{LogEntry, LogRecord, OnShift},
  subject::Subject,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Drop precision the column cannot hold, so values read back compare equal.
pub fn storable(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: i64,
  pub label:      String,
  pub department: Option<String>,
  pub created_at: String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "subject_id, label, department, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      label:      row.get(1)?,
      department: row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:         self.subject_id,
      label:      self.label,
      department: self.department,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `attendance_log` row.
#[derive(Clone)]
pub struct RawLogEntry {
  pub log_id:         i64,
  pub subject_id:     i64,
  pub check_in_time:  String,
  pub check_out_time: Option<String>,
  pub status:         String,
}

impl RawLogEntry {
  pub const COLUMNS: &'static str =
    "log_id, subject_id, check_in_time, check_out_time, status";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:         row.get(0)?,
      subject_id:     row.get(1)?,
      check_in_time:  row.get(2)?,
      check_out_time: row.get(3)?,
      status:         row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<LogEntry> {
    Ok(LogEntry {
      id:             self.log_id,
      subject_id:     self.subject_id,
      check_in_time:  decode_dt(&self.check_in_time)?,
      check_out_time: decode_opt_dt(self.check_out_time.as_deref())?,
      status:         self.status,
    })
  }
}

/// An `attendance_log` row joined with its subject.
pub struct RawLogRecord {
  pub log_id:         i64,
  pub subject_id:     i64,
  pub label:          String,
  pub department:     Option<String>,
  pub check_in_time:  String,
  pub check_out_time: Option<String>,
  pub status:         String,
}

impl RawLogRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:         row.get(0)?,
      subject_id:     row.get(1)?,
      label:          row.get(2)?,
      department:     row.get(3)?,
      check_in_time:  row.get(4)?,
      check_out_time: row.get(5)?,
      status:         row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<LogRecord> {
    Ok(LogRecord {
      id:             self.log_id,
      user_id:        self.subject_id,
      username:       self.label,
      department:     self.department,
      check_in_time:  decode_dt(&self.check_in_time)?,
      check_out_time: decode_opt_dt(self.check_out_time.as_deref())?,
      status:         self.status,
    })
  }
}

/// One row of the on-shift view.
pub struct RawOnShift {
  pub label:         String,
  pub department:    Option<String>,
  pub check_in_time: String,
}

impl RawOnShift {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      label:         row.get(0)?,
      department:    row.get(1)?,
      check_in_time: row.get(2)?,
    })
  }

  pub fn into_on_shift(self) -> Result<OnShift> {
    Ok(OnShift {
      username:      self.label,
      department:    self.department,
      check_in_time: decode_dt(&self.check_in_time)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(1500);
    let c = a + chrono::Duration::hours(10);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }
}
