//! Handler for `POST /attendance` — the state machine's entry point.
//!
//! Body: `{"name": "<label>", "type": "in" | "out"}`. The reply is always
//! `{"success": bool, "message": string}`; business rejections come back
//! with status 200 and `success: false`, an unknown label with 404.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use rollcall_core::{
  attendance::{AttendanceIntent, Reply},
  shift::{Rejection, Transition},
  store::AttendanceStore,
};

use crate::{ApiState, error::ApiError, extract::JsonBody};

/// `POST /attendance`
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  JsonBody(intent): JsonBody<AttendanceIntent>,
) -> Result<Response, ApiError>
where
  S: AttendanceStore,
{
  tracing::info!(
    name = %intent.label,
    direction = intent.direction.as_str(),
    "attendance request"
  );

  let transition = state
    .store
    .apply_intent(intent, Utc::now())
    .await
    .map_err(ApiError::from_store)?;

  let reply = Reply {
    success: transition.is_success(),
    message: transition.message(),
  };

  let status = match &transition {
    Transition::CheckedIn { subject, entry } => {
      tracing::info!(name = %subject.label, log_id = entry.id, "checked in");
      StatusCode::OK
    }
    Transition::CheckedOut { subject, entry } => {
      tracing::info!(name = %subject.label, log_id = entry.id, "checked out");
      StatusCode::OK
    }
    Transition::Rejected { reason: Rejection::UnknownSubject, .. } => {
      StatusCode::NOT_FOUND
    }
    Transition::Rejected { label, reason } => {
      tracing::info!(name = %label, ?reason, "intent rejected");
      StatusCode::OK
    }
  };

  Ok((status, Json(reply)).into_response())
}
