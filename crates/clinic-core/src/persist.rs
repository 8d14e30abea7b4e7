//! Best-effort persistence of the selection relation.
//!
//! [`FileSink`] feeds a single background writer through a `watch` channel,
//! so snapshots submitted faster than they can be written collapse to the
//! latest one. Write failures are logged and dropped; the in-memory relation
//! stays authoritative.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use tokio::{
  sync::{Notify, watch},
  task::JoinHandle,
};

use crate::{Result, relation::Snapshot};

/// Receives a full snapshot after every successful selection.
///
/// Implementations must not block the caller.
pub trait SnapshotSink: Send + Sync {
  fn submit(&self, snapshot: Snapshot);
}

/// Drops every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl SnapshotSink for DiscardSink {
  fn submit(&self, _snapshot: Snapshot) {}
}

/// Writes snapshots as JSON to a single file.
pub struct FileSink {
  tx:   watch::Sender<Option<Snapshot>>,
  stop: Arc<Notify>,
}

impl FileSink {
  /// Start the writer task on the current tokio runtime.
  ///
  /// The task exits after writing any pending snapshot once
  /// [`FileSink::shutdown`] is called or the sink is dropped.
  pub fn spawn(path: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);
    let stop = Arc::new(Notify::new());
    let handle = tokio::spawn(write_loop(path.into(), rx, stop.clone()));
    (Self { tx, stop }, handle)
  }

  /// Ask the writer to flush what is pending and exit.
  pub fn shutdown(&self) { self.stop.notify_one(); }
}

impl SnapshotSink for FileSink {
  fn submit(&self, snapshot: Snapshot) { self.tx.send_replace(Some(snapshot)); }
}

async fn write_loop(
  path: PathBuf,
  mut rx: watch::Receiver<Option<Snapshot>>,
  stop: Arc<Notify>,
) {
  loop {
    let stopping = tokio::select! {
      changed = rx.changed() => match changed {
        Ok(()) => false,
        Err(_) => break,
      },
      () = stop.notified() => true,
    };
    if !stopping || rx.has_changed().unwrap_or(false) {
      let snapshot = rx.borrow_and_update().clone();
      if let Some(snapshot) = snapshot {
        persist(&path, &snapshot).await;
      }
    }
    if stopping {
      break;
    }
  }
  tracing::debug!(path = %path.display(), "selection writer stopped");
}

async fn persist(path: &Path, snapshot: &Snapshot) {
  match write_snapshot(path, snapshot).await {
    Ok(()) => {
      tracing::debug!(path = %path.display(), selections = snapshot.len(), "selections persisted");
    }
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "failed to persist selections");
    }
  }
}

/// Write to a sibling temporary file, then rename over `path`.
async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
  let bytes = serde_json::to_vec_pretty(snapshot)?;

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent).await?;
  }
  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);

  tokio::fs::write(&tmp, &bytes).await?;
  tokio::fs::rename(&tmp, path).await?;
  Ok(())
}

/// Read a snapshot written by [`FileSink`]. A missing file is an empty
/// snapshot.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
  match std::fs::read(path) {
    Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
    Err(e) => Err(e.into()),
  }
}
