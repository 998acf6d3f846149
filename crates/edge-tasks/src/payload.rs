//! Webhook payload construction.
//!
//! Pure functions: nothing here touches a store or the network.

use edge_core::{
  model::{Environment, Feature, IdentityId},
  state::{FeatureStateChangeEvent, FeatureStateSnapshot, FeatureStateValue},
  store::FeatureStateFormatter,
  webhook::WebhookPayload,
};
use serde_json::{Value, json};

// ─── Default formatter ───────────────────────────────────────────────────────

/// Renders a feature-state fragment in the shape subscribers receive for
/// identity overrides. Identity overrides never belong to a segment, so
/// `feature_segment` is always `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFeatureStateFormatter;

impl FeatureStateFormatter for DefaultFeatureStateFormatter {
  fn generate_webhook_feature_state_data(
    &self,
    feature: &Feature,
    environment: &Environment,
    identity_id: IdentityId,
    identity_identifier: &str,
    enabled: Option<bool>,
    value: Option<&FeatureStateValue>,
  ) -> Value {
    json!({
      "feature": {
        "id":          feature.id,
        "name":        feature.name,
        "type":        feature.feature_type,
        "description": feature.description,
      },
      "environment": {
        "id":      environment.id,
        "name":    environment.name,
        "api_key": environment.api_key,
      },
      "identity":            identity_id,
      "identity_identifier": identity_identifier,
      "feature_segment":     null,
      "enabled":             enabled,
      "feature_state_value": value,
    })
  }
}

// ─── Builders ────────────────────────────────────────────────────────────────

/// Render one side of a change.
pub fn build<F>(
  formatter: &F,
  feature: &Feature,
  environment: &Environment,
  snapshot: &FeatureStateSnapshot,
) -> Value
where
  F: FeatureStateFormatter + ?Sized,
{
  formatter.generate_webhook_feature_state_data(
    feature,
    environment,
    snapshot.identity_id,
    &snapshot.identity_identifier,
    snapshot.enabled,
    snapshot.value.as_ref(),
  )
}

/// Assemble the full payload for `event`.
///
/// The previous side is always rendered before the new side.
pub fn assemble<F>(
  formatter: &F,
  feature: &Feature,
  environment: &Environment,
  event: &FeatureStateChangeEvent,
  changed_by: Option<String>,
) -> WebhookPayload
where
  F: FeatureStateFormatter + ?Sized,
{
  let previous_state = event
    .change
    .previous()
    .map(|previous| build(formatter, feature, environment, previous));
  let new_state = event
    .change
    .new_state()
    .map(|new| build(formatter, feature, environment, new));

  WebhookPayload {
    new_state,
    previous_state,
    changed_by,
    timestamp: event.timestamp.clone(),
  }
}
