//! [`Clinic`]: the application context handed to every request handler.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Error, Result,
  directory::Directory,
  hub::{NotificationHub, Subscription},
  model::{Doctor, DoctorId, Patient, PatientId, Role},
  persist::SnapshotSink,
  relation::RelationStore,
  session::Session,
};

/// What a patient sees on their own page.
#[derive(Debug, Clone, Serialize)]
pub struct PatientView {
  pub patient:         Patient,
  pub selected_doctor: Option<Doctor>,
}

/// What a doctor sees on their own page.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorView {
  pub doctor:   Doctor,
  pub patients: Vec<Patient>,
}

pub struct Clinic {
  directory: Arc<Directory>,
  relations: RelationStore,
  hub:       Arc<NotificationHub>,
}

impl Clinic {
  pub fn new(directory: Directory, sink: Arc<dyn SnapshotSink>) -> Self {
    let directory = Arc::new(directory);
    let hub = Arc::new(NotificationHub::new());
    let relations = RelationStore::new(directory.clone(), hub.clone(), sink);
    Self { directory, relations, hub }
  }

  pub fn directory(&self) -> &Directory { &self.directory }

  pub fn relations(&self) -> &RelationStore { &self.relations }

  pub fn hub(&self) -> &Arc<NotificationHub> { &self.hub }

  /// Check credentials and issue a session token.
  ///
  /// An unrecognised role fails the same way as a wrong password.
  pub fn login(&self, role: &str, login: &str, password: &str) -> Result<Session> {
    let role: Role = role.parse().map_err(|_| Error::AuthFailure)?;
    let identity = self.directory.verify_credential(role, login, password)?;
    tracing::info!(%role, id = identity.id, "login");
    Ok(Session::issue(identity))
  }

  pub fn doctors(&self) -> Vec<Doctor> { self.directory.doctors().cloned().collect() }

  pub fn select_doctor(&self, patient: PatientId, doctor: DoctorId) -> Result<()> {
    self.relations.select(patient, doctor).map(|_| ())
  }

  pub fn patient_view(&self, id: PatientId) -> Result<PatientView> {
    let patient = self
      .directory
      .patient(id)
      .cloned()
      .ok_or(Error::PatientNotFound(id))?;
    let selected_doctor = self
      .relations
      .doctor_for(id)
      .and_then(|doctor| self.directory.doctor(doctor).cloned());
    Ok(PatientView { patient, selected_doctor })
  }

  pub fn doctor_view(&self, id: DoctorId) -> Result<DoctorView> {
    let doctor = self
      .directory
      .doctor(id)
      .cloned()
      .ok_or(Error::DoctorNotFound(id))?;
    let patients = self.relations.patients_of(id);
    Ok(DoctorView { doctor, patients })
  }

  /// Open a live subscription to changes in `id`'s roster.
  pub fn watch_doctor(&self, id: DoctorId) -> Result<Subscription> {
    if !self.directory.contains_doctor(id) {
      return Err(Error::DoctorNotFound(id));
    }
    Ok(self.hub.subscribe(id))
  }
}
