//! HTTP server for Rollcall.
//!
//! Mounts the JSON API under `/api` and serves enrollment photos read-only
//! under `/images`.

use std::path::PathBuf;

use axum::Router;
use rollcall_api::{ApiState, api_router};
use rollcall_core::store::AttendanceStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub photo_dir:           PathBuf,
  pub admin_id:            String,
  pub admin_password_hash: String,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// CORS is permissive: kiosks and admin pages are served from other origins.
pub fn router<S>(state: ApiState<S>) -> Router
where
  S: AttendanceStore + 'static,
{
  let images = ServeDir::new(state.photos.dir());

  Router::new()
    .nest("/api", api_router(state))
    .nest_service("/images", images)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use rand_core::OsRng;
  use rollcall_api::{AdminGate, PhotoStore};
  use rollcall_core::subject::NewSubject;
  use rollcall_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(name: &str) -> ApiState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    let photo_dir = std::env::temp_dir()
      .join(format!("rollcall-server-{name}-{}", std::process::id()));

    ApiState {
      store:  Arc::new(store),
      gate:   Arc::new(AdminGate::new("admin", hash).unwrap()),
      photos: Arc::new(PhotoStore::new(photo_dir)),
    }
  }

  async fn seed(state: &ApiState<SqliteStore>, label: &str) -> i64 {
    let input = NewSubject::new(label, Some("Sales")).unwrap();
    state.store.add_subject(input).await.unwrap().id
  }

  async fn send(
    state:  &ApiState<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  async fn attend(state: &ApiState<SqliteStore>, name: &str, kind: &str) -> (StatusCode, Value) {
    send(state, "POST", "/api/attendance", Some(json!({"name": name, "type": kind}))).await
  }

  async fn logs(state: &ApiState<SqliteStore>) -> Vec<Value> {
    let (status, body) = send(state, "GET", "/api/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().cloned().unwrap()
  }

  // ── Attendance ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn duplicate_check_in_is_rejected() {
    let state = make_state("dup").await;
    seed(&state, "Kim").await;

    let (status, body) = attend(&state, "Kim", "in").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = attend(&state, "Kim", "in").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("already"), "{body}");

    assert_eq!(logs(&state).await.len(), 1);
  }

  #[tokio::test]
  async fn check_out_leaves_the_current_list() {
    let state = make_state("out").await;
    seed(&state, "Kim").await;
    seed(&state, "Lee").await;
    attend(&state, "Kim", "in").await;
    attend(&state, "Lee", "in").await;

    let (_, current) = send(&state, "GET", "/api/current", None).await;
    assert_eq!(current.as_array().unwrap().len(), 2);

    let (status, body) = attend(&state, "Kim", "out").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, current) = send(&state, "GET", "/api/current", None).await;
    let names: Vec<&str> = current
      .as_array()
      .unwrap()
      .iter()
      .map(|row| row["username"].as_str().unwrap())
      .collect();
    assert_eq!(names, ["Lee"]);
  }

  #[tokio::test]
  async fn check_out_without_check_in_is_rejected() {
    let state = make_state("nocheckin").await;
    seed(&state, "Kim").await;

    let (status, body) = attend(&state, "Kim", "out").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(logs(&state).await.is_empty());
  }

  #[tokio::test]
  async fn unknown_subject_is_404() {
    let state = make_state("unknown").await;
    let (status, body) = attend(&state, "Nobody", "in").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
  }

  // ── Log administration ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_log_requires_admin() {
    let state = make_state("dellog").await;
    seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let id = logs(&state).await[0]["id"].as_i64().unwrap();

    let wrong = json!({"adminId": "admin", "adminPw": "nope"});
    let (status, body) = send(&state, "DELETE", &format!("/api/logs/{id}"), Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(logs(&state).await.len(), 1);

    let right = json!({"adminId": "admin", "adminPw": "secret"});
    let (status, body) = send(&state, "DELETE", &format!("/api/logs/{id}"), Some(right)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(logs(&state).await.is_empty());
  }

  #[tokio::test]
  async fn delete_missing_log_is_404() {
    let state = make_state("dellog404").await;
    let right = json!({"adminId": "admin", "adminPw": "secret"});
    let (status, _) = send(&state, "DELETE", "/api/logs/99", Some(right)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn edit_with_unknown_field_changes_nothing() {
    let state = make_state("bogus").await;
    seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let before = logs(&state).await;
    let id = before[0]["id"].as_i64().unwrap();

    let body = json!({
      "adminId": "admin", "adminPw": "secret", "type": "bogus", "value": "x"
    });
    let (status, reply) = send(&state, "PUT", &format!("/api/logs/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["success"], false);
    assert_eq!(logs(&state).await, before);
  }

  #[tokio::test]
  async fn edit_with_wrong_credentials_changes_nothing() {
    let state = make_state("editauth").await;
    seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let before = logs(&state).await;
    let id = before[0]["id"].as_i64().unwrap();

    let body = json!({
      "adminId": "root", "adminPw": "secret", "type": "status", "value": "late"
    });
    let (status, _) = send(&state, "PUT", &format!("/api/logs/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(logs(&state).await, before);
  }

  #[tokio::test]
  async fn edit_check_out_time_closes_the_entry() {
    let state = make_state("editout").await;
    seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let id = logs(&state).await[0]["id"].as_i64().unwrap();

    let body = json!({
      "adminId": "admin", "adminPw": "secret",
      "type": "out_time", "value": "2099-01-01 18:00:00"
    });
    let (status, reply) = send(&state, "PUT", &format!("/api/logs/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{reply}");
    assert_eq!(reply["success"], true);

    let row = &logs(&state).await[0];
    assert!(!row["check_out_time"].is_null());
    assert_eq!(row["status"], "checked-out");
    let (_, current) = send(&state, "GET", "/api/current", None).await;
    assert!(current.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn edit_with_unparseable_time_is_400() {
    let state = make_state("edittime").await;
    seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let id = logs(&state).await[0]["id"].as_i64().unwrap();

    let body = json!({
      "adminId": "admin", "adminPw": "secret", "type": "time", "value": "yesterday"
    });
    let (status, _) = send(&state, "PUT", &format!("/api/logs/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Roster ──────────────────────────────────────────────────────────────────

  fn multipart_enroll(name: &str, photo: &[u8]) -> Request<Body> {
    const BOUNDARY: &str = "rollcall-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"department\"\r\n\r\nSales\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"face.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(photo);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
      .method("POST")
      .uri("/api/users")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(body))
      .unwrap()
  }

  #[tokio::test]
  async fn enroll_list_serve_and_delete() {
    let state = make_state("enroll").await;

    let resp = router(state.clone())
      .oneshot(multipart_enroll("Kim", b"JPEGDATA"))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, users) = send(&state, "GET", "/api/users", None).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "Kim");
    assert_eq!(users[0]["department"], "Sales");
    let id = users[0]["id"].as_i64().unwrap();

    let resp = router(state.clone())
      .oneshot(Request::builder().uri("/images/Kim.jpg").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"JPEGDATA");

    let wrong = json!({"adminId": "admin", "adminPw": "nope"});
    let (status, _) = send(&state, "DELETE", &format!("/api/users/{id}"), Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, users) = send(&state, "GET", "/api/users", None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let right = json!({"adminId": "admin", "adminPw": "secret", "username": "Kim"});
    let (status, body) = send(&state, "DELETE", &format!("/api/users/{id}"), Some(right)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!state.photos.path_for("Kim").unwrap().exists());
  }

  #[tokio::test]
  async fn enroll_duplicate_label_is_rejected() {
    let state = make_state("enrolldup").await;
    seed(&state, "Kim").await;

    let resp = router(state.clone())
      .oneshot(multipart_enroll("Kim", b"JPEGDATA"))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
  }

  #[tokio::test]
  async fn delete_user_with_mismatched_name_is_refused() {
    let state = make_state("mismatch").await;
    let id = seed(&state, "Kim").await;

    let body = json!({"adminId": "admin", "adminPw": "secret", "username": "Lee"});
    let (status, reply) = send(&state, "DELETE", &format!("/api/users/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], false);
    assert!(state.store.get_subject(id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn admin_routes_without_a_body_are_401() {
    let state = make_state("nobody").await;
    let id = seed(&state, "Kim").await;
    attend(&state, "Kim", "in").await;
    let log_id = logs(&state).await[0]["id"].as_i64().unwrap();

    for (method, uri) in [
      ("DELETE", format!("/api/logs/{log_id}")),
      ("PUT", format!("/api/logs/{log_id}")),
      ("DELETE", format!("/api/users/{id}")),
    ] {
      let (status, reply) = send(&state, method, &uri, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
      assert_eq!(reply["success"], false);
    }
    assert_eq!(logs(&state).await.len(), 1);
    assert!(state.store.get_subject(id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn malformed_attendance_body_is_a_json_400() {
    let state = make_state("badtype").await;
    seed(&state, "Kim").await;

    let (status, reply) = attend(&state, "Kim", "bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["success"], false);
    assert!(reply["message"].is_string());

    let (status, reply) = send(&state, "POST", "/api/attendance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["success"], false);
    assert!(logs(&state).await.is_empty());
  }

  #[tokio::test]
  async fn delete_missing_user_is_404() {
    let state = make_state("deluser404").await;
    let right = json!({"adminId": "admin", "adminPw": "secret"});
    let (status, reply) = send(&state, "DELETE", "/api/users/99", Some(right)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["message"], "subject not found: 99");
  }
}
