//! Handlers for `/patient` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/patient/me` | `?id=`; patient plus selected doctor (or `null`) |
//! | `POST` | `/patient/select-doctor` | Body: [`SelectBody`] |

use axum::{
  Json,
  extract::{Query, State},
};
use clinic_core::{DoctorId, PatientId, PatientView};
use serde::Deserialize;
use serde_json::{Value, json};

use super::IdParams;
use crate::{ApiState, error::ApiError};

/// `GET /patient/me?id=<id>`
pub async fn me(
  State(state): State<ApiState>,
  Query(params): Query<IdParams>,
) -> Result<Json<PatientView>, ApiError> {
  let view = state.clinic.patient_view(PatientId(params.id))?;
  Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
  pub patient_id: u64,
  pub doctor_id:  u64,
}

/// `POST /patient/select-doctor`, body: `{"patient_id":1,"doctor_id":10}`
pub async fn select_doctor(
  State(state): State<ApiState>,
  Json(body): Json<SelectBody>,
) -> Result<Json<Value>, ApiError> {
  state
    .clinic
    .select_doctor(PatientId(body.patient_id), DoctorId(body.doctor_id))?;
  Ok(Json(json!({ "status": "ok" })))
}
