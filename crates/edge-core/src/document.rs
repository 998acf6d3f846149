//! The edge identity document.
//!
//! Each identity evaluated at the edge gets one document holding a
//! denormalised copy of its feature-state overrides. The document is always
//! read and written as a whole item, so attributes this crate does not model
//! (traits, composite keys, multivariate values, ...) are carried through in
//! the `extra` maps rather than being dropped on write-back.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{model::FeatureId, state::FeatureStateValue};

// ─── Feature back-reference ──────────────────────────────────────────────────

/// The denormalised copy of a feature embedded in a document entry. `id`
/// points back at the relational feature; it does not own it.
///
/// Only the id is decoded. Everything else (`name`, `type`, ...) stays as
/// stored so a kept entry is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFeature {
  #[serde(
    default,
    deserialize_with = "lenient",
    skip_serializing_if = "Option::is_none"
  )]
  pub id:    Option<FeatureId>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl DocumentFeature {
  pub fn name(&self) -> Option<&str> {
    self.extra.get("name").and_then(Value::as_str)
  }

  pub fn feature_type(&self) -> Option<&str> {
    self.extra.get("type").and_then(Value::as_str)
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One feature-state override held in an identity document.
///
/// Apart from the back-reference, attributes are kept as raw JSON and decoded
/// on access, so a malformed `enabled` or `featurestate_uuid` in one entry
/// never fails the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityFeatureState {
  #[serde(
    default,
    deserialize_with = "lenient",
    skip_serializing_if = "Option::is_none"
  )]
  pub feature: Option<DocumentFeature>,
  #[serde(flatten)]
  pub extra:   Map<String, Value>,
}

impl IdentityFeatureState {
  /// The relational feature this entry refers to, if the reference is
  /// present and well-formed.
  pub fn feature_id(&self) -> Option<FeatureId> {
    self.feature.as_ref().and_then(|f| f.id)
  }

  pub fn enabled(&self) -> Option<bool> { self.attribute("enabled") }

  pub fn feature_state_value(&self) -> Option<FeatureStateValue> {
    self.attribute("feature_state_value")
  }

  pub fn featurestate_uuid(&self) -> Option<Uuid> {
    self.attribute("featurestate_uuid")
  }

  fn attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.extra.get(key)?;
    T::deserialize(value).ok()
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityDocument {
  pub identity_uuid:       Uuid,
  pub identifier:          String,
  pub environment_api_key: String,
  #[serde(default)]
  pub identity_features:   Vec<IdentityFeatureState>,
  #[serde(flatten)]
  pub extra:               Map<String, Value>,
}

impl IdentityDocument {
  /// Drop every entry whose feature is not in `valid`, keeping the order of
  /// the survivors. Entries without a usable back-reference are dropped too.
  ///
  /// Returns the removed entries.
  pub fn prune_features(
    &mut self,
    valid: &HashSet<FeatureId>,
  ) -> Vec<IdentityFeatureState> {
    let (kept, dropped) = std::mem::take(&mut self.identity_features)
      .into_iter()
      .partition(|fs| fs.feature_id().is_some_and(|id| valid.contains(&id)));
    self.identity_features = kept;
    dropped
  }
}

/// Deserialise `T`, mapping anything malformed to `None` instead of failing
/// the whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}
