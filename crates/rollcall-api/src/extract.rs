//! Request body extractors whose failures use the [`ApiError`] reply shape.
//!
//! axum's own `Json` rejects with plain-text 415/422 bodies; clients of this
//! API always branch on `success`, so every body error is a 400 `Reply`.

use axum::extract::{FromRequest, Json, Request};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A JSON body. Decode failures, including a missing content type, are 400.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Self(value))
  }
}

/// The body of an admin request.
///
/// A missing or blank body decodes as `T::default()`, so absent credentials
/// reach the gate and are answered with 401 instead of a body error.
#[derive(Debug)]
pub struct AdminBody<T>(pub T);

impl<T, S> FromRequest<S> for AdminBody<T>
where
  T: DeserializeOwned + Default,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let raw = Bytes::from_request(req, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if raw.iter().all(u8::is_ascii_whitespace) {
      return Ok(Self(T::default()));
    }
    serde_json::from_slice(&raw)
      .map(Self)
      .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http};
  use serde::Deserialize;

  use super::*;
  use crate::admin::AdminCredentials;

  #[derive(Debug, Default, Deserialize)]
  struct Creds {
    #[serde(flatten)]
    credentials: AdminCredentials,
  }

  fn request(content_type: Option<&str>, body: &'static str) -> Request {
    let mut builder = http::Request::builder().method("POST").uri("/");
    if let Some(ct) = content_type {
      builder = builder.header("content-type", ct);
    }
    builder.body(Body::from(body)).unwrap()
  }

  #[tokio::test]
  async fn blank_admin_body_is_empty_credentials() {
    for body in ["", "  \n"] {
      let AdminBody(creds) = AdminBody::<Creds>::from_request(request(None, body), &())
        .await
        .unwrap();
      assert!(creds.credentials.admin_id.is_empty());
      assert!(creds.credentials.admin_pw.is_empty());
    }
  }

  #[tokio::test]
  async fn admin_body_reads_without_content_type() {
    let AdminBody(creds) = AdminBody::<Creds>::from_request(
      request(None, r#"{"adminId":"admin","adminPw":"pw"}"#),
      &(),
    )
    .await
    .unwrap();
    assert_eq!(creds.credentials.admin_id, "admin");
  }

  #[tokio::test]
  async fn malformed_bodies_are_bad_requests() {
    let err = AdminBody::<Creds>::from_request(request(None, "{nope"), &())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = JsonBody::<Creds>::from_request(request(None, "{}"), &())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = JsonBody::<Vec<u8>>::from_request(request(Some("application/json"), r#""x""#), &())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
  }
}
