//! [`SqliteStore`] — the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, params};

use rollcall_core::{
  Error as CoreError,
  attendance::{
    AttendanceIntent, LogEdit, LogEntry, LogRecord, OnShift, STATUS_CHECKED_IN,
    STATUS_CHECKED_OUT,
  },
  shift::{self, Rejection, ShiftState, Step, Transition},
  store::AttendanceStore,
  subject::{NewSubject, Subject},
};

use crate::{
  Result,
  encode::{
    RawLogEntry, RawLogRecord, RawOnShift, RawSubject, encode_dt, storable,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rollcall store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every call
/// runs on the connection's single worker thread, and multi-statement
/// operations additionally run inside an IMMEDIATE transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn subject_by_id(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawSubject>> {
  conn
    .query_row(
      &format!("SELECT {} FROM subjects WHERE subject_id = ?1", RawSubject::COLUMNS),
      params![id],
      RawSubject::from_row,
    )
    .optional()
}

fn subject_by_label(
  conn: &rusqlite::Connection,
  label: &str,
) -> rusqlite::Result<Option<RawSubject>> {
  conn
    .query_row(
      &format!("SELECT {} FROM subjects WHERE label = ?1", RawSubject::COLUMNS),
      params![label],
      RawSubject::from_row,
    )
    .optional()
}

fn log_by_id(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawLogEntry>> {
  conn
    .query_row(
      &format!("SELECT {} FROM attendance_log WHERE log_id = ?1", RawLogEntry::COLUMNS),
      params![id],
      RawLogEntry::from_row,
    )
    .optional()
}

fn open_entry(
  conn: &rusqlite::Connection,
  subject_id: i64,
) -> rusqlite::Result<Option<RawLogEntry>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM attendance_log
         WHERE subject_id = ?1 AND check_out_time IS NULL",
        RawLogEntry::COLUMNS
      ),
      params![subject_id],
      RawLogEntry::from_row,
    )
    .optional()
}

/// Outcome of the state-machine transaction, before decoding.
enum Applied {
  Opened(RawSubject, RawLogEntry),
  Closed(RawSubject, RawLogEntry),
  Rejected(String, Rejection),
}

/// Check that `edit` keeps the entry invariants. The outer result carries
/// database failures, the inner one rule violations.
fn check_edit(
  conn: &rusqlite::Connection,
  current: &RawLogEntry,
  edit: &LogEdit,
  now: DateTime<Utc>,
) -> rusqlite::Result<Result<()>> {
  let entry = match current.clone().into_entry() {
    Ok(entry) => entry,
    Err(e) => return Ok(Err(e)),
  };

  let verdict = match edit {
    LogEdit::Status(_) => Ok(()),
    LogEdit::CheckIn(at) => match entry.check_out_time {
      Some(out) if *at > out => Err(CoreError::InvalidTimeRange),
      // An open entry is closed at "now" or later.
      None if *at > now => Err(CoreError::InvalidTimeRange),
      _ => Ok(()),
    },
    LogEdit::CheckOut(Some(at)) if *at < entry.check_in_time => {
      Err(CoreError::InvalidTimeRange)
    }
    LogEdit::CheckOut(Some(_)) => Ok(()),
    // Reopening must not create a second open entry for the subject.
    LogEdit::CheckOut(None) if entry.is_open() => Ok(()),
    LogEdit::CheckOut(None) => match open_entry(conn, entry.subject_id)? {
      Some(_) => Err(CoreError::ShiftConflict(entry.subject_id)),
      None => Ok(()),
    },
  };

  Ok(verdict.map_err(Into::into))
}

/// Status after a check-out edit. Only machine-written labels follow the
/// open/closed state; anything an admin typed is kept.
fn status_after_close_edit<'a>(closing: bool, current: &'a str) -> &'a str {
  match (closing, current) {
    (true, STATUS_CHECKED_IN) => STATUS_CHECKED_OUT,
    (false, STATUS_CHECKED_OUT) => STATUS_CHECKED_IN,
    _ => current,
  }
}

fn storable_edit(edit: LogEdit) -> LogEdit {
  match edit {
    LogEdit::CheckIn(at) => LogEdit::CheckIn(storable(at)),
    LogEdit::CheckOut(at) => LogEdit::CheckOut(at.map(storable)),
    status => status,
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  // ── Roster ────────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let created_at = encode_dt(storable(Utc::now()));

    let raw: Result<RawSubject> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if subject_by_label(&tx, &input.label)?.is_some() {
          return Ok(Err(CoreError::DuplicateLabel(input.label).into()));
        }

        tx.execute(
          "INSERT INTO subjects (label, department, created_at) VALUES (?1, ?2, ?3)",
          params![input.label, input.department, created_at],
        )?;
        let subject = RawSubject {
          subject_id: tx.last_insert_rowid(),
          label:      input.label,
          department: input.department,
          created_at,
        };
        tx.commit()?;
        Ok(Ok(subject))
      })
      .await?;

    raw?.into_subject()
  }

  async fn get_subject(&self, id: i64) -> Result<Option<Subject>> {
    let raw = self
      .conn
      .call(move |conn| Ok(subject_by_id(conn, id)?))
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn find_subject(&self, label: &str) -> Result<Option<Subject>> {
    let label = label.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(subject_by_label(conn, &label)?))
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM subjects ORDER BY subject_id",
          RawSubject::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn delete_subject(&self, id: i64) -> Result<Option<Subject>> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(subject) = subject_by_id(&tx, id)? else {
          return Ok(None);
        };
        tx.execute("DELETE FROM attendance_log WHERE subject_id = ?1", params![id])?;
        tx.execute("DELETE FROM subjects WHERE subject_id = ?1", params![id])?;
        tx.commit()?;
        Ok(Some(subject))
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  // ── State machine ─────────────────────────────────────────────────────────

  async fn apply_intent(
    &self,
    intent: AttendanceIntent,
    at: DateTime<Utc>,
  ) -> Result<Transition> {
    let at_str = encode_dt(storable(at));
    let AttendanceIntent { label, direction } = intent;

    // The read of the open entry and the write that follows share one
    // IMMEDIATE transaction; the partial unique index backs it up.
    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(subject) = subject_by_label(&tx, &label)? else {
          return Ok(Applied::Rejected(label, Rejection::UnknownSubject));
        };

        let open = open_entry(&tx, subject.subject_id)?;
        let state = match &open {
          Some(open) => ShiftState::OnShift { open_log_id: open.log_id },
          None => ShiftState::OffShift,
        };

        let applied = match shift::decide(&state, direction) {
          Step::Open => {
            tx.execute(
              "INSERT INTO attendance_log (subject_id, check_in_time, check_out_time, status)
               VALUES (?1, ?2, NULL, ?3)",
              params![subject.subject_id, at_str, STATUS_CHECKED_IN],
            )?;
            let entry = RawLogEntry {
              log_id:         tx.last_insert_rowid(),
              subject_id:     subject.subject_id,
              check_in_time:  at_str,
              check_out_time: None,
              status:         STATUS_CHECKED_IN.to_owned(),
            };
            Applied::Opened(subject, entry)
          }
          Step::Close { log_id } => {
            // Never close before the entry opened. Timestamps are fixed-width,
            // so string order is time order.
            let closed_at = match open {
              Some(open) if open.check_in_time > at_str => {
                tracing::warn!(
                  log_id,
                  check_in = %open.check_in_time,
                  at = %at_str,
                  "check-out precedes check-in, clamping"
                );
                open.check_in_time
              }
              _ => at_str,
            };
            tx.execute(
              "UPDATE attendance_log SET check_out_time = ?1, status = ?2 WHERE log_id = ?3",
              params![closed_at, STATUS_CHECKED_OUT, log_id],
            )?;
            let entry = tx.query_row(
              &format!("SELECT {} FROM attendance_log WHERE log_id = ?1", RawLogEntry::COLUMNS),
              params![log_id],
              RawLogEntry::from_row,
            )?;
            Applied::Closed(subject, entry)
          }
          Step::Reject(reason) => Applied::Rejected(subject.label, reason),
        };

        tx.commit()?;
        Ok(applied)
      })
      .await?;

    Ok(match applied {
      Applied::Opened(subject, entry) => Transition::CheckedIn {
        subject: subject.into_subject()?,
        entry:   entry.into_entry()?,
      },
      Applied::Closed(subject, entry) => Transition::CheckedOut {
        subject: subject.into_subject()?,
        entry:   entry.into_entry()?,
      },
      Applied::Rejected(label, reason) => Transition::Rejected { label, reason },
    })
  }

  // ── Ledger reads ──────────────────────────────────────────────────────────

  async fn on_shift(&self) -> Result<Vec<OnShift>> {
    let raws: Vec<RawOnShift> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.label, s.department, l.check_in_time
           FROM attendance_log l
           JOIN subjects s ON s.subject_id = l.subject_id
           WHERE l.check_out_time IS NULL
           ORDER BY l.check_in_time DESC, l.log_id DESC",
        )?;
        let rows = stmt
          .query_map([], RawOnShift::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOnShift::into_on_shift).collect()
  }

  async fn recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawLogRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT l.log_id, l.subject_id, s.label, s.department,
                  l.check_in_time, l.check_out_time, l.status
           FROM attendance_log l
           JOIN subjects s ON s.subject_id = l.subject_id
           ORDER BY l.check_in_time DESC, l.log_id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(params![limit_val], RawLogRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLogRecord::into_record).collect()
  }

  async fn get_log(&self, id: i64) -> Result<Option<LogEntry>> {
    let raw = self
      .conn
      .call(move |conn| Ok(log_by_id(conn, id)?))
      .await?;

    raw.map(RawLogEntry::into_entry).transpose()
  }

  // ── Ledger corrections ────────────────────────────────────────────────────

  async fn edit_log(&self, id: i64, edit: LogEdit) -> Result<LogEntry> {
    let edit = storable_edit(edit);
    let now = Utc::now();

    let raw: Result<RawLogEntry> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current) = log_by_id(&tx, id)? else {
          return Ok(Err(CoreError::LogNotFound(id).into()));
        };
        if let Err(e) = check_edit(&tx, &current, &edit, now)? {
          return Ok(Err(e));
        }

        match &edit {
          LogEdit::Status(status) => tx.execute(
            "UPDATE attendance_log SET status = ?1 WHERE log_id = ?2",
            params![status, id],
          )?,
          LogEdit::CheckIn(at) => tx.execute(
            "UPDATE attendance_log SET check_in_time = ?1 WHERE log_id = ?2",
            params![encode_dt(*at), id],
          )?,
          LogEdit::CheckOut(at) => tx.execute(
            "UPDATE attendance_log SET check_out_time = ?1, status = ?2 WHERE log_id = ?3",
            params![
              at.map(encode_dt),
              status_after_close_edit(at.is_some(), &current.status),
              id
            ],
          )?,
        };

        let updated = tx.query_row(
          &format!("SELECT {} FROM attendance_log WHERE log_id = ?1", RawLogEntry::COLUMNS),
          params![id],
          RawLogEntry::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(updated))
      })
      .await?;

    raw?.into_entry()
  }

  async fn delete_log(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM attendance_log WHERE log_id = ?1", params![id])?)
      })
      .await?;

    Ok(deleted > 0)
  }
}
