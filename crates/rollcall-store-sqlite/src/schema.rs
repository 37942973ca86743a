//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    label       TEXT NOT NULL UNIQUE,   -- matching key shared with the recognizer
    department  TEXT,
    created_at  TEXT NOT NULL
);

-- One row per shift segment. check_out_time IS NULL marks the open entry.
CREATE TABLE IF NOT EXISTS attendance_log (
    log_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id      INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    check_in_time   TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    check_out_time  TEXT,
    status          TEXT NOT NULL
);

-- At most one open entry per subject.
CREATE UNIQUE INDEX IF NOT EXISTS attendance_log_one_open
    ON attendance_log(subject_id) WHERE check_out_time IS NULL;

CREATE INDEX IF NOT EXISTS attendance_log_check_in_idx
    ON attendance_log(check_in_time);

PRAGMA user_version = 1;
";
