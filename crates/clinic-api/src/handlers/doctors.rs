//! Handlers for `/doctors` and `/doctor` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/doctors` | All doctors, ordered by id |
//! | `GET`  | `/doctor` | `?id=`; doctor plus assigned patients |
//! | `GET`  | `/doctor/stream` | `?id=`; server-sent `ping` / `update` events |

use std::convert::Infallible;

use axum::{
  Json,
  extract::{Query, State},
  response::sse::{Event, Sse},
};
use clinic_core::{Doctor, DoctorId, DoctorView, Notice};
use futures::{Stream, StreamExt as _};

use super::IdParams;
use crate::{ApiState, error::ApiError};

/// `GET /doctors`
pub async fn list(State(state): State<ApiState>) -> Json<Vec<Doctor>> {
  Json(state.clinic.doctors())
}

/// `GET /doctor?id=<id>`
pub async fn get_one(
  State(state): State<ApiState>,
  Query(params): Query<IdParams>,
) -> Result<Json<DoctorView>, ApiError> {
  let view = state.clinic.doctor_view(DoctorId(params.id))?;
  Ok(Json(view))
}

/// `GET /doctor/stream?id=<id>`
///
/// The subscription is registered before the response starts, and released
/// when axum drops the body after the client goes away.
pub async fn stream(
  State(state): State<ApiState>,
  Query(params): Query<IdParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
  let subscription = state.clinic.watch_doctor(DoctorId(params.id))?;
  tracing::info!(doctor = params.id, subscription = %subscription.id(), "stream opened");
  let events = subscription
    .notices(state.heartbeat)
    .map(|notice| Ok::<_, Infallible>(to_event(notice)));
  Ok(Sse::new(events))
}

fn to_event(notice: Notice) -> Event {
  Event::default().event(notice.event()).data(notice.data())
}
