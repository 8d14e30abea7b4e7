pub mod doctors;
pub mod patients;
pub mod session;

use serde::Deserialize;

/// `?id=<n>` query string shared by the per-entity endpoints.
#[derive(Debug, Deserialize)]
pub struct IdParams {
  pub id: u64,
}
