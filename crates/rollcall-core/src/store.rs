//! The `AttendanceStore` trait.
//!
//! Implemented by storage backends (e.g. `rollcall-store-sqlite`). The API
//! layer depends on this abstraction, not on any concrete backend. One store
//! plays both roles: the roster of subjects and the attendance ledger.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  DomainError,
  attendance::{AttendanceIntent, LogEdit, LogEntry, LogRecord, OnShift},
  shift::Transition,
  subject::{NewSubject, Subject},
};

/// Number of entries `GET /api/logs` returns.
pub const RECENT_LOG_LIMIT: usize = 100;

/// Abstraction over a Rollcall store backend.
///
/// Domain rule violations (duplicate label, reopening a second entry, …) are
/// reported through `Self::Error` and recoverable with
/// [`DomainError::as_domain`]. State-machine rejections are not errors: they
/// come back as [`Transition::Rejected`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Roster ────────────────────────────────────────────────────────────

  /// Enroll a subject. Fails with `DuplicateLabel` if the label is taken.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Retrieve a subject by its matching label. Returns `None` if not found.
  fn find_subject<'a>(
    &'a self,
    label: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// List the whole roster, ordered by id.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject together with its log entries. Returns the removed
  /// subject, or `None` if it did not exist.
  fn delete_subject(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  // ── State machine ─────────────────────────────────────────────────────

  /// Validate `intent` against the subject's current shift state and apply
  /// the resulting transition at time `at`.
  ///
  /// Reading the state and writing the transition must be atomic with
  /// respect to every other call for the same subject.
  fn apply_intent(
    &self,
    intent: AttendanceIntent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  // ── Ledger reads ──────────────────────────────────────────────────────

  /// Subjects with an open entry, most recent check-in first.
  fn on_shift(
    &self,
  ) -> impl Future<Output = Result<Vec<OnShift>, Self::Error>> + Send + '_;

  /// Up to `limit` entries joined with their subject, newest first.
  fn recent_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<LogRecord>, Self::Error>> + Send + '_;

  /// Retrieve a single entry. Returns `None` if not found.
  fn get_log(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<LogEntry>, Self::Error>> + Send + '_;

  // ── Ledger corrections ────────────────────────────────────────────────

  /// Apply one field correction. Fails with `LogNotFound`, or with a
  /// rejection if the result would break an entry invariant.
  fn edit_log(
    &self,
    id: i64,
    edit: LogEdit,
  ) -> impl Future<Output = Result<LogEntry, Self::Error>> + Send + '_;

  /// Delete an entry. Returns `false` if it did not exist.
  fn delete_log(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
