//! edge-worker binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the task endpoints over HTTP.
//!
//! # One-off sync
//!
//! To reconcile a single identity document without starting the server:
//!
//! ```
//! cargo run -p edge-worker -- --sync-identity <IDENTITY_UUID>
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use edge_store_sqlite::SqliteStore;
use edge_worker::{AppState, WorkerConfig, delivery::HttpWebhookDelivery};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Edge identity task worker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Sync the features of one identity document and exit.
  #[arg(long, value_name = "IDENTITY_UUID")]
  sync_identity: Option<Uuid>,
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("EDGE"))
    .build()
    .context("failed to read config file")?;

  let worker_cfg: WorkerConfig = settings
    .try_deserialize()
    .context("failed to deserialise WorkerConfig")?;

  let store_path = expand_tilde(&worker_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let delivery = HttpWebhookDelivery::new(
    Arc::clone(&store),
    Duration::from_secs(worker_cfg.webhook_timeout_secs),
  )
  .context("failed to build webhook client")?;

  let state = AppState::new(store, Arc::new(delivery), Arc::new(worker_cfg));

  // Helper mode: sync one identity and exit.
  if let Some(identity_uuid) = cli.sync_identity {
    state
      .reconciler
      .reconcile(identity_uuid)
      .await
      .with_context(|| format!("failed to sync identity {identity_uuid}"))?;
    return Ok(());
  }

  let address = format!("{}:{}", state.config.host, state.config.port);
  let app = edge_worker::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
