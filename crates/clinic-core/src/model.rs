//! Patients, doctors, and the identifiers that tie them together.
//!
//! Both entity kinds are loaded once from the seed and never change while the
//! process runs. Passwords are accepted on deserialisation but never written
//! back out.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Numeric patient identity, unique within the directory.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(pub u64);

/// Numeric doctor identity, unique within the directory.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DoctorId(pub u64);

impl fmt::Display for PatientId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for DoctorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
  pub id:       PatientId,
  pub login:    String,
  #[serde(skip_serializing)]
  pub password: String,
  pub name:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
  pub id:          DoctorId,
  pub login:       String,
  #[serde(skip_serializing)]
  pub password:    String,
  pub first_name:  String,
  pub last_name:   String,
  #[serde(default)]
  pub middle_name: String,
  pub speciality:  String,
}

impl Doctor {
  /// `last first middle`, skipping empty parts.
  pub fn display_name(&self) -> String {
    [&self.last_name, &self.first_name, &self.middle_name]
      .into_iter()
      .map(|part| part.trim())
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

// ─── Authentication ──────────────────────────────────────────────────────────

/// Which half of the directory a login belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Patient,
  Doctor,
}

/// The outcome of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
  pub role: Role,
  /// Patient or doctor id, depending on `role`.
  pub id:   u64,
  pub name: String,
}
