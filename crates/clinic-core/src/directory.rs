//! [`Directory`]: the load-once registry of patients, doctors, and logins.
//!
//! Built from a [`Seed`] at startup and read-only afterwards, so it is shared
//! behind an `Arc` without any locking.

use std::{
  collections::{BTreeMap, HashMap, hash_map::Entry},
  path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  model::{Doctor, DoctorId, Identity, Patient, PatientId, Role},
};

/// Shape of the seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
  #[serde(default)]
  pub patients: Vec<Patient>,
  #[serde(default)]
  pub doctors:  Vec<Doctor>,
}

struct LoginEntry {
  id:       u64,
  password: String,
}

pub struct Directory {
  patients: BTreeMap<PatientId, Patient>,
  doctors:  BTreeMap<DoctorId, Doctor>,
  logins:   HashMap<(Role, String), LoginEntry>,
}

impl Directory {
  /// Read and validate a JSON seed file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let bytes = std::fs::read(path)?;
    let seed: Seed = serde_json::from_slice(&bytes)?;
    Self::from_seed(seed)
  }

  /// Build the directory and its login index.
  ///
  /// Ids must be unique per kind, and logins unique per role.
  pub fn from_seed(seed: Seed) -> Result<Self> {
    let mut patients = BTreeMap::new();
    let mut doctors = BTreeMap::new();
    let mut logins = HashMap::new();

    for patient in seed.patients {
      if patients.contains_key(&patient.id) {
        return Err(Error::DuplicatePatient(patient.id));
      }
      index_login(&mut logins, Role::Patient, &patient.login, patient.id.0, &patient.password)?;
      patients.insert(patient.id, patient);
    }

    for doctor in seed.doctors {
      if doctors.contains_key(&doctor.id) {
        return Err(Error::DuplicateDoctor(doctor.id));
      }
      index_login(&mut logins, Role::Doctor, &doctor.login, doctor.id.0, &doctor.password)?;
      doctors.insert(doctor.id, doctor);
    }

    Ok(Self { patients, doctors, logins })
  }

  pub fn patient(&self, id: PatientId) -> Option<&Patient> { self.patients.get(&id) }

  pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> { self.doctors.get(&id) }

  pub fn contains_patient(&self, id: PatientId) -> bool { self.patients.contains_key(&id) }

  pub fn contains_doctor(&self, id: DoctorId) -> bool { self.doctors.contains_key(&id) }

  /// All doctors, ordered by id.
  pub fn doctors(&self) -> impl Iterator<Item = &Doctor> { self.doctors.values() }

  pub fn patient_count(&self) -> usize { self.patients.len() }

  pub fn doctor_count(&self) -> usize { self.doctors.len() }

  /// Exact-match check of a role-scoped login.
  ///
  /// Fails with [`Error::AuthFailure`] without saying whether the login or
  /// the password was wrong.
  pub fn verify_credential(
    &self,
    role: Role,
    login: &str,
    password: &str,
  ) -> Result<Identity> {
    let entry = self
      .logins
      .get(&(role, login.to_owned()))
      .filter(|entry| entry.password == password)
      .ok_or(Error::AuthFailure)?;

    let name = match role {
      Role::Patient => self
        .patients
        .get(&PatientId(entry.id))
        .map(|p| p.name.clone()),
      Role::Doctor => self
        .doctors
        .get(&DoctorId(entry.id))
        .map(Doctor::display_name),
    }
    .ok_or(Error::AuthFailure)?;

    Ok(Identity { role, id: entry.id, name })
  }
}

fn index_login(
  logins: &mut HashMap<(Role, String), LoginEntry>,
  role: Role,
  login: &str,
  id: u64,
  password: &str,
) -> Result<()> {
  match logins.entry((role, login.to_owned())) {
    Entry::Occupied(_) => Err(Error::DuplicateLogin { role, login: login.to_owned() }),
    Entry::Vacant(slot) => {
      slot.insert(LoginEntry { id, password: password.to_owned() });
      Ok(())
    }
  }
}
