//! Webhook subscribers and the payload sent to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::EnvironmentId;

pub type WebhookId = i64;

/// An environment-scoped webhook subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
  pub id:             WebhookId,
  pub environment_id: EnvironmentId,
  pub url:            String,
  pub enabled:        bool,
}

/// The classification attached to an outbound webhook.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookEventType {
  FlagUpdated,
  FlagDeleted,
}

/// The notification body describing one feature-state change.
///
/// The state fragments are opaque to this crate; they are whatever the
/// configured [`FeatureStateFormatter`](crate::store::FeatureStateFormatter)
/// produced. Absent sides are omitted from the serialised form, not `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub new_state:      Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_state: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub changed_by:     Option<String>,
  /// Passed through from the triggering event without reformatting.
  pub timestamp:      String,
}
