//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the same `{"success": false, "message": ...}` shape as
//! a successful reply, so clients can always branch on `success`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rollcall_core::{DomainError, attendance::Reply};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Admin credentials were missing or wrong. Deliberately carries no detail.
  #[error("authorization failed")]
  Unauthorized,

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  /// A business rule refused the request. Reported with a 200 status.
  #[error("{0}")]
  Rejected(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure, surfacing domain rule violations as client
  /// outcomes and everything else as a server error.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    if let Some(domain) = e.as_domain() {
      return classify(domain);
    }
    Self::Store(Box::new(e))
  }
}

impl From<rollcall_core::Error> for ApiError {
  fn from(e: rollcall_core::Error) -> Self { classify(&e) }
}

fn classify(e: &rollcall_core::Error) -> ApiError {
  use rollcall_core::Error as E;
  match e {
    E::SubjectNotFound(_) | E::LogNotFound(_) => ApiError::NotFound(e.to_string()),
    _ if e.is_rejection() => ApiError::Rejected(e.to_string()),
    _ => ApiError::BadRequest(e.to_string()),
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Rejected(_) => StatusCode::OK,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(Reply::rejected(self.to_string()))).into_response()
  }
}
