//! JSON REST API for Rollcall.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rollcall_core::store::AttendanceStore`]. TLS, static assets, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(state))
//! ```

pub mod admin;
pub mod attendance;
pub mod error;
pub mod extract;
pub mod logs;
pub mod photos;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use rollcall_core::store::AttendanceStore;

pub use admin::{AdminCredentials, AdminGate};
pub use error::ApiError;
pub use photos::PhotoStore;

/// Enrollment photos larger than this are refused.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub gate:   Arc<AdminGate>,
  pub photos: Arc<PhotoStore>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      gate:   Arc::clone(&self.gate),
      photos: Arc::clone(&self.photos),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: AttendanceStore + 'static,
{
  Router::new()
    .route("/attendance", post(attendance::record::<S>))
    .route(
      "/users",
      get(users::list::<S>)
        .post(users::enroll::<S>)
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
    )
    .route("/users/{id}", delete(users::remove::<S>))
    .route("/current", get(logs::current::<S>))
    .route("/logs", get(logs::list::<S>))
    .route("/logs/{id}", delete(logs::remove::<S>).put(logs::edit::<S>))
    .with_state(state)
}
