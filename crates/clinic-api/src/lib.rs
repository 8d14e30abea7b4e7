//! JSON and server-sent-events API for the clinic registry.
//!
//! Exposes an axum [`Router`] backed by a shared [`Clinic`]. CORS, static
//! assets, and the listener are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", clinic_api::api_router(clinic.clone(), heartbeat))
//! ```

pub mod error;
pub mod handlers;

use std::{sync::Arc, time::Duration};

use axum::{
  Json, Router,
  routing::{get, post},
};
use clinic_core::Clinic;
use serde_json::{Value, json};

pub use error::ApiError;

use handlers::{doctors, patients, session};

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct ApiState {
  pub clinic:    Arc<Clinic>,
  /// Idle interval after which a stream emits a `ping` event.
  pub heartbeat: Duration,
}

/// Build the API router for `clinic`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(clinic: Arc<Clinic>, heartbeat: Duration) -> Router<()> {
  Router::new()
    .route("/ping", get(ping))
    .route("/login", post(session::login))
    // Doctors
    .route("/doctors", get(doctors::list))
    .route("/doctor", get(doctors::get_one))
    .route("/doctor/stream", get(doctors::stream))
    // Patients
    .route("/patient/me", get(patients::me))
    .route("/patient/select-doctor", post(patients::select_doctor))
    .with_state(ApiState { clinic, heartbeat })
}

/// `GET /ping`
async fn ping() -> Json<Value> { Json(json!({ "ok": "true" })) }

// ─── Integration tests ────────────────────────────────────────────────────────
