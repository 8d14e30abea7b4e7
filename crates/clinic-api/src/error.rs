//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid credentials")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<clinic_core::Error> for ApiError {
  fn from(e: clinic_core::Error) -> Self {
    use clinic_core::Error as E;
    match e {
      E::PatientNotFound(_) | E::DoctorNotFound(_) => ApiError::NotFound(e.to_string()),
      E::AuthFailure => ApiError::Unauthorized,
      E::DuplicatePatient(_) | E::DuplicateDoctor(_) | E::DuplicateLogin { .. } => {
        ApiError::BadRequest(e.to_string())
      }
      E::Io(_) | E::Json(_) => ApiError::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
