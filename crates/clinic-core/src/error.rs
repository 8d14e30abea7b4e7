//! Error types for `clinic-core`.

use thiserror::Error;

use crate::model::{DoctorId, PatientId, Role};

#[derive(Debug, Error)]
pub enum Error {
  #[error("patient not found: {0}")]
  PatientNotFound(PatientId),

  #[error("doctor not found: {0}")]
  DoctorNotFound(DoctorId),

  /// Returned for an unknown login and for a wrong password alike.
  #[error("invalid credentials")]
  AuthFailure,

  #[error("duplicate patient id in seed: {0}")]
  DuplicatePatient(PatientId),

  #[error("duplicate doctor id in seed: {0}")]
  DuplicateDoctor(DoctorId),

  #[error("duplicate {role} login in seed: {login:?}")]
  DuplicateLogin { role: Role, login: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
