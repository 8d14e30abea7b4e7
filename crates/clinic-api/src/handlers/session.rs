//! Handler for `POST /login`.

use axum::{Json, extract::State};
use clinic_core::Session;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// `"patient"` or `"doctor"`.
  pub role:     String,
  pub login:    String,
  pub password: String,
}

/// `POST /login`, body: `{"role":"patient","login":"...","password":"..."}`
pub async fn login(
  State(state): State<ApiState>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Session>, ApiError> {
  let session = state.clinic.login(&body.role, &body.login, &body.password)?;
  Ok(Json(session))
}
