//! Handlers for the attendance ledger.
//!
//! | Method   | Path        | Notes |
//! |----------|-------------|-------|
//! | `GET`    | `/current`  | Subjects on shift, most recent check-in first |
//! | `GET`    | `/logs`     | Latest 100 entries joined with the subject |
//! | `PUT`    | `/logs/:id` | Body: `{adminId, adminPw, type: "status"\|"time"\|"out_time", value}` |
//! | `DELETE` | `/logs/:id` | Body: `{adminId, adminPw}` |

use axum::{
  Json,
  extract::{Path, State},
};
use rollcall_core::{
  attendance::{LogEdit, LogRecord, OnShift, Reply},
  store::{AttendanceStore, RECENT_LOG_LIMIT},
};
use serde::Deserialize;

use crate::{ApiState, admin::AdminCredentials, error::ApiError, extract::AdminBody};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /current`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<OnShift>>, ApiError>
where
  S: AttendanceStore,
{
  let on_shift = state.store.on_shift().await.map_err(ApiError::from_store)?;
  Ok(Json(on_shift))
}

/// `GET /logs`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<LogRecord>>, ApiError>
where
  S: AttendanceStore,
{
  let logs = state
    .store
    .recent_logs(RECENT_LOG_LIMIT)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(logs))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EditBody {
  #[serde(flatten)]
  pub credentials: AdminCredentials,
  #[serde(rename = "type", default)]
  pub kind:        String,
  #[serde(default)]
  pub value:       Option<String>,
}

/// `PUT /logs/:id` — changes exactly one field.
///
/// Credentials are checked before the field name is even looked at.
pub async fn edit<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
  AdminBody(body): AdminBody<EditBody>,
) -> Result<Json<Reply>, ApiError>
where
  S: AttendanceStore,
{
  state.gate.verify(&body.credentials)?;

  let edit = LogEdit::parse(&body.kind, body.value.as_deref())?.ok_or_else(|| {
    ApiError::BadRequest(format!("unrecognised edit type: {:?}", body.kind))
  })?;

  let entry = state
    .store
    .edit_log(id, edit)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(log_id = entry.id, field = %body.kind, "log entry edited");
  Ok(Json(Reply::ok(format!("log {id} updated"))))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RemoveBody {
  #[serde(flatten)]
  pub credentials: AdminCredentials,
}

/// `DELETE /logs/:id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
  AdminBody(body): AdminBody<RemoveBody>,
) -> Result<Json<Reply>, ApiError>
where
  S: AttendanceStore,
{
  state.gate.verify(&body.credentials)?;

  let deleted = state
    .store
    .delete_log(id)
    .await
    .map_err(ApiError::from_store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("log entry not found: {id}")));
  }

  tracing::info!(log_id = id, "log entry deleted");
  Ok(Json(Reply::ok(format!("log {id} deleted"))))
}
