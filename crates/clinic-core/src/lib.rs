//! Core types and services for the clinic registry.
//!
//! The [`Clinic`] context owns the patient/doctor [`Directory`], the mutable
//! [`RelationStore`], and the [`NotificationHub`] used to push roster changes
//! to doctors' open sessions. It is free of HTTP concerns; the API crate
//! wraps it.

pub mod clinic;
pub mod directory;
pub mod error;
pub mod hub;
pub mod model;
pub mod persist;
pub mod relation;
pub mod session;

pub use clinic::{Clinic, DoctorView, PatientView};
pub use directory::{Directory, Seed};
pub use error::{Error, Result};
pub use hub::{Notice, NotificationHub, Subscription, SubscriptionId};
pub use model::{Doctor, DoctorId, Identity, Patient, PatientId, Role};
pub use persist::{DiscardSink, FileSink, SnapshotSink, load_snapshot};
pub use relation::{RelationStore, Selection, Snapshot};
pub use session::Session;
