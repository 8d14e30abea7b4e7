//! clinic server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), loads the
//! seed and any persisted selections, and serves the JSON API and doctor
//! event streams over HTTP.

use std::{future::IntoFuture as _, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use clinic_server::{ServerConfig, Service};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clinic registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = ServerConfig::load(cli.config)?;

  let service = Service::start(&config)?;
  let app = service.router(&config);
  let address = format!("{}:{}", config.host, config.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Open event streams never finish on their own, so stop on Ctrl-C instead
  // of waiting for connections to drain.
  tokio::select! {
    result = axum::serve(listener, app).into_future() => result.context("server error")?,
    _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
  }

  service.shutdown().await;
  Ok(())
}
