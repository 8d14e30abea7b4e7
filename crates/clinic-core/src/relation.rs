//! [`RelationStore`]: the mutable patient → doctor selection.
//!
//! The forward map and its reverse index sit behind one readers-writer lock.
//! A successful [`RelationStore::select`] commits under the write lock, takes a
//! snapshot, releases the lock, and only then hands the snapshot to the
//! [`SnapshotSink`] and publishes to the chosen doctor's subscribers.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  directory::Directory,
  hub::NotificationHub,
  model::{DoctorId, Patient, PatientId},
  persist::SnapshotSink,
};

/// One persisted `(patient, doctor)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
  pub patient_id: PatientId,
  pub doctor_id:  DoctorId,
}

/// The full relation at a point in time, ordered by patient id.
pub type Snapshot = Vec<Selection>;

#[derive(Default)]
struct Relation {
  doctor_of:   BTreeMap<PatientId, DoctorId>,
  patients_of: BTreeMap<DoctorId, BTreeSet<PatientId>>,
}

impl Relation {
  /// Point `patient` at `doctor`, returning the previous doctor.
  fn assign(&mut self, patient: PatientId, doctor: DoctorId) -> Option<DoctorId> {
    let previous = self.doctor_of.insert(patient, doctor);
    if let Some(old) = previous.filter(|old| *old != doctor)
      && let Some(set) = self.patients_of.get_mut(&old)
    {
      set.remove(&patient);
      if set.is_empty() {
        self.patients_of.remove(&old);
      }
    }
    self.patients_of.entry(doctor).or_default().insert(patient);
    previous
  }

  fn snapshot(&self) -> Snapshot {
    self
      .doctor_of
      .iter()
      .map(|(&patient_id, &doctor_id)| Selection { patient_id, doctor_id })
      .collect()
  }
}

pub struct RelationStore {
  directory: Arc<Directory>,
  hub:       Arc<NotificationHub>,
  sink:      Arc<dyn SnapshotSink>,
  relation:  RwLock<Relation>,
}

impl RelationStore {
  pub fn new(
    directory: Arc<Directory>,
    hub: Arc<NotificationHub>,
    sink: Arc<dyn SnapshotSink>,
  ) -> Self {
    Self { directory, hub, sink, relation: RwLock::new(Relation::default()) }
  }

  /// Record that `patient` has chosen `doctor`.
  ///
  /// Returns the doctor previously selected, if any. Only `doctor` is
  /// notified; a previous doctor is not told the patient left.
  pub fn select(&self, patient: PatientId, doctor: DoctorId) -> Result<Option<DoctorId>> {
    if !self.directory.contains_patient(patient) {
      return Err(Error::PatientNotFound(patient));
    }
    if !self.directory.contains_doctor(doctor) {
      return Err(Error::DoctorNotFound(doctor));
    }

    let (previous, snapshot) = {
      let mut relation = self.relation.write();
      let previous = relation.assign(patient, doctor);
      (previous, relation.snapshot())
    };

    tracing::info!(%patient, %doctor, previous = ?previous, "doctor selected");
    self.sink.submit(snapshot);
    self.hub.publish(doctor);
    Ok(previous)
  }

  pub fn doctor_for(&self, patient: PatientId) -> Option<DoctorId> {
    self.relation.read().doctor_of.get(&patient).copied()
  }

  /// Patients currently assigned to `doctor`, ordered by id.
  pub fn patients_of(&self, doctor: DoctorId) -> Vec<Patient> {
    let ids: Vec<PatientId> = self
      .relation
      .read()
      .patients_of
      .get(&doctor)
      .map(|set| set.iter().copied().collect())
      .unwrap_or_default();

    ids
      .into_iter()
      .filter_map(|id| self.directory.patient(id).cloned())
      .collect()
  }

  /// Merge previously persisted selections into the map.
  ///
  /// Existing entries are kept unless overwritten by key. Pairs naming an id
  /// the directory does not know are skipped. Neither persistence nor
  /// notification is triggered. Returns the number of pairs applied.
  pub fn restore(&self, selections: impl IntoIterator<Item = Selection>) -> usize {
    let mut relation = self.relation.write();
    let mut applied = 0;
    for Selection { patient_id, doctor_id } in selections {
      if !self.directory.contains_patient(patient_id)
        || !self.directory.contains_doctor(doctor_id)
      {
        tracing::warn!(patient = %patient_id, doctor = %doctor_id, "skipping stale selection");
        continue;
      }
      relation.assign(patient_id, doctor_id);
      applied += 1;
    }
    applied
  }

  pub fn snapshot(&self) -> Snapshot { self.relation.read().snapshot() }
}

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::directory::tests::sample;

  #[derive(Default)]
  struct RecordingSink(Mutex<Vec<Snapshot>>);

  impl SnapshotSink for RecordingSink {
    fn submit(&self, snapshot: Snapshot) { self.0.lock().push(snapshot); }
  }

  fn store() -> (RelationStore, Arc<NotificationHub>, Arc<RecordingSink>) {
    let hub = Arc::new(NotificationHub::new());
    let sink = Arc::new(RecordingSink::default());
    let store = RelationStore::new(Arc::new(sample()), hub.clone(), sink.clone());
    (store, hub, sink)
  }

  fn ids(patients: Vec<Patient>) -> Vec<u64> { patients.into_iter().map(|p| p.id.0).collect() }

  #[test]
  fn select_assigns_both_directions() {
    let (store, _, _) = store();
    assert_eq!(store.select(PatientId(1), DoctorId(10)).unwrap(), None);
    assert_eq!(store.doctor_for(PatientId(1)), Some(DoctorId(10)));
    assert_eq!(ids(store.patients_of(DoctorId(10))), vec![1]);
  }

  #[test]
  fn doctor_collects_many_patients() {
    let (store, _, _) = store();
    store.select(PatientId(2), DoctorId(10)).unwrap();
    store.select(PatientId(1), DoctorId(10)).unwrap();
    assert_eq!(ids(store.patients_of(DoctorId(10))), vec![1, 2]);
    assert!(store.patients_of(DoctorId(20)).is_empty());
  }

  #[test]
  fn reselect_moves_patient_between_doctors() {
    let (store, _, _) = store();
    store.select(PatientId(1), DoctorId(10)).unwrap();
    let previous = store.select(PatientId(1), DoctorId(20)).unwrap();

    assert_eq!(previous, Some(DoctorId(10)));
    assert_eq!(store.doctor_for(PatientId(1)), Some(DoctorId(20)));
    assert!(store.patients_of(DoctorId(10)).is_empty());
    assert_eq!(ids(store.patients_of(DoctorId(20))), vec![1]);
  }

  #[test]
  fn unknown_ids_leave_relation_untouched() {
    let (store, hub, sink) = store();
    store.select(PatientId(1), DoctorId(10)).unwrap();
    let mut sub = hub.subscribe(DoctorId(10));

    assert!(matches!(
      store.select(PatientId(999), DoctorId(10)),
      Err(Error::PatientNotFound(PatientId(999)))
    ));
    assert!(matches!(
      store.select(PatientId(1), DoctorId(999)),
      Err(Error::DoctorNotFound(DoctorId(999)))
    ));

    assert_eq!(store.doctor_for(PatientId(1)), Some(DoctorId(10)));
    assert_eq!(store.doctor_for(PatientId(999)), None);
    assert_eq!(sink.0.lock().len(), 1);
    assert!(!sub.try_changed());
  }

  #[test]
  fn select_submits_full_snapshot_and_notifies_new_doctor_only() {
    let (store, hub, sink) = store();
    store.select(PatientId(1), DoctorId(10)).unwrap();

    let mut old = hub.subscribe(DoctorId(10));
    let mut new = hub.subscribe(DoctorId(20));
    store.select(PatientId(2), DoctorId(10)).unwrap();
    store.select(PatientId(1), DoctorId(20)).unwrap();

    let last = sink.0.lock().last().cloned().unwrap();
    assert_eq!(last, vec![
      Selection { patient_id: PatientId(1), doctor_id: DoctorId(20) },
      Selection { patient_id: PatientId(2), doctor_id: DoctorId(10) },
    ]);
    // Doctor 10 was signalled once for patient 2; patient 1 leaving is silent.
    assert!(old.try_changed());
    assert!(!old.try_changed());
    assert!(new.try_changed());
  }

  #[test]
  fn restore_merges_and_skips_unknown_ids() {
    let (store, hub, sink) = store();
    let mut sub = hub.subscribe(DoctorId(10));
    store.select(PatientId(2), DoctorId(20)).unwrap();

    let applied = store.restore([
      Selection { patient_id: PatientId(1), doctor_id: DoctorId(10) },
      Selection { patient_id: PatientId(3), doctor_id: DoctorId(10) },
      Selection { patient_id: PatientId(1), doctor_id: DoctorId(77) },
    ]);

    assert_eq!(applied, 1);
    assert_eq!(store.doctor_for(PatientId(1)), Some(DoctorId(10)));
    assert_eq!(store.doctor_for(PatientId(2)), Some(DoctorId(20)));
    assert_eq!(sink.0.lock().len(), 1);
    assert!(!sub.try_changed());
  }

  #[test]
  fn concurrent_selects_keep_indexes_consistent() {
    let (store, _, _) = store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
      .map(|i| {
        let store = store.clone();
        std::thread::spawn(move || {
          for round in 0..200 {
            let doctor = if (i + round) % 2 == 0 { DoctorId(10) } else { DoctorId(20) };
            store.select(PatientId(1 + i % 2), doctor).unwrap();
          }
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    for patient in [PatientId(1), PatientId(2)] {
      let doctor = store.doctor_for(patient).unwrap();
      let listed: Vec<_> = [DoctorId(10), DoctorId(20)]
        .into_iter()
        .filter(|d| store.patients_of(*d).iter().any(|p| p.id == patient))
        .collect();
      assert_eq!(listed, vec![doctor]);
    }
  }
}
