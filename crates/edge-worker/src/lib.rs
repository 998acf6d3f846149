//! Task worker for the edge identity tasks.
//!
//! Exposes an axum [`Router`] the task queue calls to run one task per
//! request. Each request runs its task to completion before responding, so
//! the queue sees failures as HTTP errors and owns any retry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tasks/feature-state-webhooks` | Body: [`FeatureStateChangeRequest`] |
//! | `POST` | `/tasks/identities/{identity_uuid}/sync-features` | |
//! | `GET`  | `/health` | |

pub mod delivery;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  routing::{get, post},
};
use edge_core::store::{
  FeatureSetResolver, IdentityDocumentStore, RelationalStore, WebhookDelivery,
  WebhookRegistry,
};
use edge_tasks::{FeatureStateChangeRequest, IdentityReconciler, WebhookDispatcher};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime worker configuration, deserialised from `config.toml` and
/// `EDGE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_webhook_timeout_secs")]
  pub webhook_timeout_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8600 }

fn default_store_path() -> PathBuf { PathBuf::from("edge.db") }

fn default_webhook_timeout_secs() -> u64 { 10 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, D> {
  pub dispatcher: WebhookDispatcher<S, S, D>,
  pub reconciler: IdentityReconciler<S, S>,
  pub config:     Arc<WorkerConfig>,
}

impl<S, D> Clone for AppState<S, D> {
  fn clone(&self) -> Self {
    Self {
      dispatcher: self.dispatcher.clone(),
      reconciler: self.reconciler.clone(),
      config:     Arc::clone(&self.config),
    }
  }
}

impl<S, D> AppState<S, D>
where
  S: RelationalStore + WebhookRegistry + FeatureSetResolver + IdentityDocumentStore,
  D: WebhookDelivery,
{
  /// Wire both tasks to a single store.
  pub fn new(store: Arc<S>, delivery: Arc<D>, config: Arc<WorkerConfig>) -> Self {
    Self {
      dispatcher: WebhookDispatcher::new(Arc::clone(&store), Arc::clone(&store), delivery),
      reconciler: IdentityReconciler::new(Arc::clone(&store), store),
      config,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the worker.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: RelationalStore
    + WebhookRegistry
    + FeatureSetResolver
    + IdentityDocumentStore
    + 'static,
  D: WebhookDelivery + 'static,
{
  Router::new()
    .route("/health",                                         get(health))
    .route("/tasks/feature-state-webhooks",                   post(feature_state_webhooks::<S, D>))
    .route("/tasks/identities/{identity_uuid}/sync-features", post(sync_identity_features::<S, D>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> &'static str { "ok" }

/// `POST /tasks/feature-state-webhooks`
async fn feature_state_webhooks<S, D>(
  State(state): State<AppState<S, D>>,
  Json(request): Json<FeatureStateChangeRequest>,
) -> Result<StatusCode, Error>
where
  S: RelationalStore + WebhookRegistry + 'static,
  D: WebhookDelivery + 'static,
{
  state
    .dispatcher
    .dispatch_for_feature_state_change(request)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /tasks/identities/{identity_uuid}/sync-features`
async fn sync_identity_features<S, D>(
  State(state): State<AppState<S, D>>,
  Path(identity_uuid): Path<Uuid>,
) -> Result<StatusCode, Error>
where
  S: IdentityDocumentStore + FeatureSetResolver + 'static,
  D: WebhookDelivery + 'static,
{
  state.reconciler.reconcile(identity_uuid).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Integration tests ────────────────────────────────────────────────────────
