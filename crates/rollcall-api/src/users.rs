//! Handlers for `/users` endpoints — the roster.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `GET`    | `/users`     | `[{id, username, department}]` |
//! | `POST`   | `/users`     | multipart: `name`, `department`, `photo` |
//! | `DELETE` | `/users/:id` | Body: `{adminId, adminPw, username?}`; also removes the photo |

use axum::{
  Json,
  extract::{Multipart, Path, State, multipart::MultipartError},
};
use bytes::Bytes;
use rollcall_core::{
  Error as CoreError,
  attendance::Reply,
  store::AttendanceStore,
  subject::{NewSubject, RosterEntry},
};
use serde::Deserialize;

use crate::{ApiState, admin::AdminCredentials, error::ApiError, extract::AdminBody};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<RosterEntry>>, ApiError>
where
  S: AttendanceStore,
{
  let subjects = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subjects.into_iter().map(RosterEntry::from).collect()))
}

// ─── Enroll ───────────────────────────────────────────────────────────────────

fn bad_multipart(e: MultipartError) -> ApiError {
  ApiError::BadRequest(format!("malformed upload: {}", e.body_text()))
}

/// `POST /users` — multipart form with `name`, `department`, and `photo`.
///
/// The subject is inserted first so label uniqueness is settled before the
/// photo file is written. A newly enrolled subject becomes recognisable
/// only once a kiosk reloads its roster.
pub async fn enroll<S>(
  State(state): State<ApiState<S>>,
  mut multipart: Multipart,
) -> Result<Json<Reply>, ApiError>
where
  S: AttendanceStore,
{
  let mut name: Option<String> = None;
  let mut department: Option<String> = None;
  let mut photo: Option<Bytes> = None;

  while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
    let field_name = field.name().map(str::to_owned);
    match field_name.as_deref() {
      Some("name") => name = Some(field.text().await.map_err(bad_multipart)?),
      Some("department") => {
        department = Some(field.text().await.map_err(bad_multipart)?)
      }
      Some("photo") => photo = Some(field.bytes().await.map_err(bad_multipart)?),
      _ => {}
    }
  }

  let name = name.ok_or_else(|| ApiError::BadRequest("missing field: name".into()))?;
  let photo = photo
    .filter(|p| !p.is_empty())
    .ok_or_else(|| ApiError::BadRequest("missing field: photo".into()))?;

  let input = NewSubject::new(&name, department.as_deref())?;
  let subject = state
    .store
    .add_subject(input)
    .await
    .map_err(ApiError::from_store)?;

  if let Err(e) = state.photos.save(&subject.label, photo).await {
    tracing::error!(name = %subject.label, error = %e, "failed to store photo");
    if let Err(undo) = state.store.delete_subject(subject.id).await {
      tracing::error!(id = subject.id, error = %undo, "failed to roll back enrollment");
    }
    return Err(ApiError::Store(Box::new(e)));
  }

  tracing::info!(id = subject.id, name = %subject.label, "subject enrolled");
  Ok(Json(Reply::ok(format!("{} enrolled", subject.label))))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RemoveBody {
  #[serde(flatten)]
  pub credentials: AdminCredentials,
  /// When present, must match the stored label.
  #[serde(default)]
  pub username:    Option<String>,
}

/// `DELETE /users/:id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
  AdminBody(body): AdminBody<RemoveBody>,
) -> Result<Json<Reply>, ApiError>
where
  S: AttendanceStore,
{
  state.gate.verify(&body.credentials)?;

  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::SubjectNotFound(id))?;

  if let Some(expected) = body.username.as_deref()
    && expected != subject.label
  {
    return Err(ApiError::Rejected(format!(
      "subject {id} is {}, not {expected}",
      subject.label
    )));
  }

  let removed = state
    .store
    .delete_subject(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::SubjectNotFound(id))?;

  state.photos.remove(&removed.label).await;

  tracing::info!(id, name = %removed.label, "subject deleted");
  Ok(Json(Reply::ok(format!("{} deleted", removed.label))))
}
