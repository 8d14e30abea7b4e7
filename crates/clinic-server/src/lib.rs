//! HTTP front end for the clinic registry.
//!
//! Loads configuration and seed data, builds the [`Clinic`] context, and
//! wraps the API router with CORS, request tracing, and optional static
//! asset serving.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{Method, header},
};
use clinic_core::{Clinic, Directory, DiscardSink, FileSink, SnapshotSink, load_snapshot};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::{
  cors::{Any, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLINIC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub seed_path:       PathBuf,
  /// Defaults to `selections.json` next to the seed file.
  pub selections_path: Option<PathBuf>,
  pub persist:         bool,
  pub static_dir:      Option<PathBuf>,
  pub heartbeat_secs:  u64,
}

impl ServerConfig {
  /// Layer defaults, the optional TOML file at `path`, and the environment.
  pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
    let path: PathBuf = path.into();
    let settings = config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8080_i64)?
      .set_default("seed_path", "data/seed.json")?
      .set_default("persist", true)?
      .set_default("heartbeat_secs", 25_i64)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CLINIC"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn selections_path(&self) -> PathBuf {
    self.selections_path.clone().unwrap_or_else(|| {
      self
        .seed_path
        .parent()
        .unwrap_or(Path::new(""))
        .join("selections.json")
    })
  }

  pub fn heartbeat(&self) -> Duration { Duration::from_secs(self.heartbeat_secs.max(1)) }
}

// ─── Service ──────────────────────────────────────────────────────────────────

struct Writer {
  sink:   Arc<FileSink>,
  handle: JoinHandle<()>,
}

/// The running application: the shared [`Clinic`] plus the persistence
/// writer that must be flushed on shutdown.
pub struct Service {
  pub clinic: Arc<Clinic>,
  writer:     Option<Writer>,
}

impl Service {
  /// Load the seed and the last snapshot, and start the persistence writer.
  ///
  /// A seed that cannot be loaded is fatal; a snapshot that cannot be read
  /// is logged and ignored.
  pub fn start(config: &ServerConfig) -> anyhow::Result<Self> {
    let directory = Directory::load(&config.seed_path)
      .with_context(|| format!("failed to load seed from {:?}", config.seed_path))?;
    tracing::info!(
      patients = directory.patient_count(),
      doctors = directory.doctor_count(),
      "seed loaded"
    );

    let selections_path = config.selections_path();
    let writer = config.persist.then(|| {
      let (sink, handle) = FileSink::spawn(&selections_path);
      Writer { sink: Arc::new(sink), handle }
    });
    let sink: Arc<dyn SnapshotSink> = match &writer {
      Some(writer) => writer.sink.clone(),
      None => Arc::new(DiscardSink),
    };

    let clinic = Clinic::new(directory, sink);
    match load_snapshot(&selections_path) {
      Ok(snapshot) => {
        let restored = clinic.relations().restore(snapshot);
        tracing::info!(restored, path = %selections_path.display(), "selections restored");
      }
      Err(e) => {
        tracing::warn!(error = %e, path = %selections_path.display(), "ignoring unreadable selections");
      }
    }

    Ok(Self { clinic: Arc::new(clinic), writer })
  }

  /// Build the full HTTP application.
  pub fn router(&self, config: &ServerConfig) -> Router {
    let api = clinic_api::api_router(self.clinic.clone(), config.heartbeat());
    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = &config.static_dir {
      app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(cors()).layer(TraceLayer::new_for_http())
  }

  /// Flush the last pending snapshot and stop the writer.
  pub async fn shutdown(self) {
    if let Some(Writer { sink, handle }) = self.writer {
      sink.shutdown();
      if let Err(e) = handle.await {
        tracing::warn!(error = %e, "selection writer failed");
      }
    }
  }
}

fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ─── Integration tests ────────────────────────────────────────────────────────
