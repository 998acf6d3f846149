//! Collaborator traits consumed by the edge tasks.
//!
//! The traits are implemented by storage backends (e.g. `edge-store-sqlite`)
//! and by the outbound delivery layer in `edge-worker`. The tasks in
//! `edge-tasks` depend on these abstractions, never on a concrete backend, so
//! tests can substitute in-memory doubles.
//!
//! All async methods return `Send` futures so implementations can be driven
//! from a multi-threaded tokio runtime.

use std::{collections::HashSet, future::Future};

use serde_json::Value;
use uuid::Uuid;

use crate::{
  document::IdentityDocument,
  model::{Environment, EnvironmentId, Feature, FeatureId, IdentityId, User, UserId},
  state::FeatureStateValue,
  webhook::{Webhook, WebhookEventType, WebhookPayload},
};

// ─── Relational source of truth ──────────────────────────────────────────────

/// Read access to the relational models. Every lookup returns `None` when the
/// record does not exist; callers decide whether that is fatal.
pub trait RelationalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_environment_by_api_key<'a>(
    &'a self,
    api_key: &'a str,
  ) -> impl Future<Output = Result<Option<Environment>, Self::Error>> + Send + 'a;

  fn get_feature(
    &self,
    id: FeatureId,
  ) -> impl Future<Output = Result<Option<Feature>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;
}

/// Lists webhook subscribers.
pub trait WebhookRegistry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Enabled webhooks for one environment, in registration order. May be
  /// empty.
  fn list_enabled_webhooks(
    &self,
    environment_id: EnvironmentId,
  ) -> impl Future<Output = Result<Vec<Webhook>, Self::Error>> + Send + '_;
}

/// Resolves which features are currently valid for an environment.
pub trait FeatureSetResolver: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The authoritative feature ids for the environment behind
  /// `environment_api_key`. An unknown key yields an empty set.
  fn valid_feature_ids<'a>(
    &'a self,
    environment_api_key: &'a str,
  ) -> impl Future<Output = Result<HashSet<FeatureId>, Self::Error>> + Send + 'a;
}

// ─── Edge document store ─────────────────────────────────────────────────────

/// Whole-item access to identity documents.
pub trait IdentityDocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if no document exists for `identity_uuid`.
  fn get_item_from_uuid(
    &self,
    identity_uuid: Uuid,
  ) -> impl Future<Output = Result<Option<IdentityDocument>, Self::Error>> + Send + '_;

  /// Replace the stored document wholesale. Writing an identical document is
  /// not an error.
  fn put_item<'a>(
    &'a self,
    document: &'a IdentityDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Webhooks ────────────────────────────────────────────────────────────────

/// Sends a payload to every subscriber of an environment. Enumerating the
/// subscriber URLs and any per-URL retry policy belong to the implementation.
pub trait WebhookDelivery: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn call_environment_webhooks<'a>(
    &'a self,
    environment: &'a Environment,
    payload: &'a WebhookPayload,
    event_type: WebhookEventType,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Renders one side of a feature-state change into the fragment embedded in
/// a [`WebhookPayload`]. Must be pure.
pub trait FeatureStateFormatter: Send + Sync {
  fn generate_webhook_feature_state_data(
    &self,
    feature: &Feature,
    environment: &Environment,
    identity_id: IdentityId,
    identity_identifier: &str,
    enabled: Option<bool>,
    value: Option<&FeatureStateValue>,
  ) -> Value;
}
