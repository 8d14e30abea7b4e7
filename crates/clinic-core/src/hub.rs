//! [`NotificationHub`]: per-doctor fan-out of "roster changed" signals.
//!
//! Each [`Subscription`] owns the receiving half of a one-slot channel. A
//! publish that finds the slot already full is dropped; the pending signal
//! already tells the receiver to re-fetch, so nothing is lost. Dropping the
//! subscription removes it from the registry.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use futures::{Stream, stream};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::model::DoctorId;

/// Unique identity of one subscription. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

type Senders = HashMap<SubscriptionId, mpsc::Sender<()>>;

#[derive(Default)]
pub struct NotificationHub {
  subscribers: Mutex<HashMap<DoctorId, Senders>>,
}

impl NotificationHub {
  pub fn new() -> Self { Self::default() }

  /// Register a new subscription for `doctor`.
  pub fn subscribe(self: &Arc<Self>, doctor: DoctorId) -> Subscription {
    let (tx, rx) = mpsc::channel(1);
    let id = SubscriptionId(Uuid::new_v4());

    let count = {
      let mut subscribers = self.subscribers.lock();
      let senders = subscribers.entry(doctor).or_default();
      senders.insert(id, tx);
      senders.len()
    };
    tracing::debug!(%doctor, subscription = %id, subscribers = count, "subscribed");

    Subscription { id, doctor, hub: Arc::clone(self), rx }
  }

  /// Remove a subscription. Returns `false` if it was already gone.
  pub fn unsubscribe(&self, doctor: DoctorId, id: SubscriptionId) -> bool {
    let removed = {
      let mut subscribers = self.subscribers.lock();
      let Some(senders) = subscribers.get_mut(&doctor) else {
        return false;
      };
      let removed = senders.remove(&id).is_some();
      if senders.is_empty() {
        subscribers.remove(&doctor);
      }
      removed
    };
    if removed {
      tracing::debug!(%doctor, subscription = %id, "unsubscribed");
    }
    removed
  }

  /// Signal every current subscriber of `doctor` without waiting on any of
  /// them. Returns how many received a fresh signal; the rest already had one
  /// pending.
  pub fn publish(&self, doctor: DoctorId) -> usize {
    let senders: Vec<mpsc::Sender<()>> = self
      .subscribers
      .lock()
      .get(&doctor)
      .map(|senders| senders.values().cloned().collect())
      .unwrap_or_default();

    let mut delivered = 0;
    for tx in senders {
      match tx.try_send(()) {
        Ok(()) => delivered += 1,
        Err(TrySendError::Full(())) => {}
        // Receiver dropped between the registry read and the send.
        Err(TrySendError::Closed(())) => {}
      }
    }
    tracing::trace!(%doctor, delivered, "published");
    delivered
  }

  pub fn subscriber_count(&self, doctor: DoctorId) -> usize {
    self.subscribers.lock().get(&doctor).map_or(0, HashMap::len)
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// One event emitted to a streaming client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
  /// Heartbeat; carries nothing actionable.
  Ping,
  /// The doctor's roster changed; re-fetch it.
  Update,
}

impl Notice {
  pub fn event(self) -> &'static str {
    match self {
      Notice::Ping => "ping",
      Notice::Update => "update",
    }
  }

  pub fn data(self) -> &'static str {
    match self {
      Notice::Ping => "ok",
      Notice::Update => "changed",
    }
  }
}

/// A live registration with the hub. Unregisters itself on drop.
pub struct Subscription {
  id:     SubscriptionId,
  doctor: DoctorId,
  hub:    Arc<NotificationHub>,
  rx:     mpsc::Receiver<()>,
}

impl Subscription {
  pub fn id(&self) -> SubscriptionId { self.id }

  pub fn doctor(&self) -> DoctorId { self.doctor }

  /// Wait for the next signal. Returns `false` once the hub has dropped this
  /// subscription's sender.
  pub async fn changed(&mut self) -> bool { self.rx.recv().await.is_some() }

  /// Consume a pending signal, if any, without waiting.
  pub fn try_changed(&mut self) -> bool { self.rx.try_recv().is_ok() }

  /// Turn the subscription into the event stream served to a client.
  ///
  /// Opens with a [`Notice::Ping`], then yields [`Notice::Update`] for each
  /// signal and [`Notice::Ping`] after every `heartbeat` of silence. The
  /// stream only ends if the hub drops the sender; dropping the stream
  /// releases the subscription.
  pub fn notices(
    self,
    heartbeat: Duration,
  ) -> impl Stream<Item = Notice> + Send + 'static {
    stream::unfold((self, true), move |(mut sub, opening)| async move {
      if opening {
        return Some((Notice::Ping, (sub, false)));
      }
      let notice = tokio::select! {
        signal = sub.rx.recv() => signal.map(|()| Notice::Update),
        () = tokio::time::sleep(heartbeat) => Some(Notice::Ping),
      };
      notice.map(|notice| (notice, (sub, false)))
    })
  }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.hub.unsubscribe(self.doctor, self.id); }
}

#[cfg(test)]
mod tests {
  use std::pin::pin;

  use futures::StreamExt as _;
  use tokio::time::timeout;

  use super::*;

  const D: DoctorId = DoctorId(10);

  #[tokio::test]
  async fn burst_of_publishes_coalesces_to_one_signal() {
    let hub = Arc::new(NotificationHub::new());
    let mut sub = hub.subscribe(D);

    assert_eq!(hub.publish(D), 1);
    assert_eq!(hub.publish(D), 0);
    assert_eq!(hub.publish(D), 0);

    assert!(sub.try_changed());
    assert!(!sub.try_changed());
  }

  #[tokio::test]
  async fn signal_after_consumption_is_delivered_again() {
    let hub = Arc::new(NotificationHub::new());
    let mut sub = hub.subscribe(D);

    hub.publish(D);
    assert!(timeout(Duration::from_secs(1), sub.changed()).await.unwrap());
    hub.publish(D);
    assert!(timeout(Duration::from_secs(1), sub.changed()).await.unwrap());
  }

  #[tokio::test]
  async fn publish_reaches_only_the_target_doctor() {
    let hub = Arc::new(NotificationHub::new());
    let mut a = hub.subscribe(D);
    let mut b = hub.subscribe(D);
    let mut other = hub.subscribe(DoctorId(20));

    assert_eq!(hub.publish(D), 2);
    assert!(a.try_changed());
    assert!(b.try_changed());
    assert!(!other.try_changed());
  }

  #[tokio::test]
  async fn drop_unregisters_and_later_publish_is_harmless() {
    let hub = Arc::new(NotificationHub::new());
    let sub = hub.subscribe(D);
    let id = sub.id();
    assert_eq!(hub.subscriber_count(D), 1);

    drop(sub);
    assert_eq!(hub.subscriber_count(D), 0);
    assert_eq!(hub.publish(D), 0);
    // Already gone: idempotent.
    assert!(!hub.unsubscribe(D, id));
  }

  #[tokio::test]
  async fn explicit_unsubscribe_then_drop_runs_once() {
    let hub = Arc::new(NotificationHub::new());
    let keep = hub.subscribe(D);
    let sub = hub.subscribe(D);

    assert!(hub.unsubscribe(D, sub.id()));
    assert_eq!(hub.subscriber_count(D), 1);
    drop(sub);
    assert_eq!(hub.subscriber_count(D), 1);
    drop(keep);
    assert_eq!(hub.subscriber_count(D), 0);
  }

  #[tokio::test]
  async fn notices_open_with_ping_then_forward_updates() {
    let hub = Arc::new(NotificationHub::new());
    let sub = hub.subscribe(D);
    let mut notices = pin!(sub.notices(Duration::from_secs(60)));

    assert_eq!(notices.next().await, Some(Notice::Ping));
    hub.publish(D);
    let next = timeout(Duration::from_secs(1), notices.next()).await.unwrap();
    assert_eq!(next, Some(Notice::Update));
  }

  #[tokio::test]
  async fn notices_emit_heartbeat_when_idle() {
    let hub = Arc::new(NotificationHub::new());
    let sub = hub.subscribe(D);
    let mut notices = pin!(sub.notices(Duration::from_millis(20)));

    assert_eq!(notices.next().await, Some(Notice::Ping));
    let next = timeout(Duration::from_secs(1), notices.next()).await.unwrap();
    assert_eq!(next, Some(Notice::Ping));
  }

  #[tokio::test]
  async fn dropping_the_stream_releases_the_subscription() {
    let hub = Arc::new(NotificationHub::new());
    let notices = hub.subscribe(D).notices(Duration::from_secs(60));
    assert_eq!(hub.subscriber_count(D), 1);
    drop(notices);
    assert_eq!(hub.subscriber_count(D), 0);
  }
}
