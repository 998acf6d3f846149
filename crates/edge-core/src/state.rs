//! Feature-state snapshots and the change events built from them.
//!
//! A change has a previous side, a new side, or both. The "neither" case is
//! rejected at construction, so every [`StateChange`] in hand is well-formed.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  model::{FeatureId, IdentityId, UserId},
  webhook::WebhookEventType,
};

// ─── Values ──────────────────────────────────────────────────────────────────

/// A typed flag value. JSON `null` is represented by `Option::None` at the
/// use site rather than by a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureStateValue {
  Boolean(bool),
  Integer(i64),
  Float(f64),
  String(String),
}

impl From<&str> for FeatureStateValue {
  fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for FeatureStateValue {
  fn from(s: String) -> Self { Self::String(s) }
}

impl From<i64> for FeatureStateValue {
  fn from(n: i64) -> Self { Self::Integer(n) }
}

impl From<bool> for FeatureStateValue {
  fn from(b: bool) -> Self { Self::Boolean(b) }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The feature/identity pair a snapshot is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStateSubject {
  pub feature_id:          FeatureId,
  pub environment_key:     String,
  pub identity_id:         IdentityId,
  pub identity_identifier: String,
}

/// One feature's state for one identity at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStateSnapshot {
  pub feature_id:          FeatureId,
  pub environment_key:     String,
  pub identity_id:         IdentityId,
  pub identity_identifier: String,
  pub enabled:             Option<bool>,
  pub value:               Option<FeatureStateValue>,
}

impl FeatureStateSnapshot {
  /// Build a snapshot for `subject`. Returns `None` when neither `enabled`
  /// nor `value` is set, i.e. the side was not supplied at all.
  pub fn from_parts(
    subject: &FeatureStateSubject,
    enabled: Option<bool>,
    value: Option<FeatureStateValue>,
  ) -> Option<Self> {
    if enabled.is_none() && value.is_none() {
      return None;
    }
    Some(Self {
      feature_id: subject.feature_id,
      environment_key: subject.environment_key.clone(),
      identity_id: subject.identity_id,
      identity_identifier: subject.identity_identifier.clone(),
      enabled,
      value,
    })
  }
}

// ─── Change ──────────────────────────────────────────────────────────────────

/// The legal shapes of a feature-state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
  PreviousOnly(FeatureStateSnapshot),
  NewOnly(FeatureStateSnapshot),
  Both {
    previous: FeatureStateSnapshot,
    new:      FeatureStateSnapshot,
  },
}

impl StateChange {
  /// Pair up two optional sides, failing with [`Error::InvalidEvent`] when
  /// both are missing.
  pub fn from_sides(
    previous: Option<FeatureStateSnapshot>,
    new: Option<FeatureStateSnapshot>,
  ) -> Result<Self> {
    match (previous, new) {
      (Some(previous), Some(new)) => Ok(Self::Both { previous, new }),
      (Some(previous), None) => Ok(Self::PreviousOnly(previous)),
      (None, Some(new)) => Ok(Self::NewOnly(new)),
      (None, None) => Err(Error::InvalidEvent),
    }
  }

  pub fn previous(&self) -> Option<&FeatureStateSnapshot> {
    match self {
      Self::PreviousOnly(previous) | Self::Both { previous, .. } => {
        Some(previous)
      }
      Self::NewOnly(_) => None,
    }
  }

  pub fn new_state(&self) -> Option<&FeatureStateSnapshot> {
    match self {
      Self::NewOnly(new) | Self::Both { new, .. } => Some(new),
      Self::PreviousOnly(_) => None,
    }
  }

  /// The most recent side: the new state when present, otherwise the
  /// previous one. Both sides share the same subject.
  pub fn latest(&self) -> &FeatureStateSnapshot {
    match self {
      Self::NewOnly(new) | Self::Both { new, .. } => new,
      Self::PreviousOnly(previous) => previous,
    }
  }

  /// A change with a resulting state is an update; a change that only has a
  /// previous state looks like a deletion to subscribers.
  pub fn event_type(&self) -> WebhookEventType {
    match self {
      Self::PreviousOnly(_) => WebhookEventType::FlagDeleted,
      Self::NewOnly(_) | Self::Both { .. } => WebhookEventType::FlagUpdated,
    }
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A change plus its attribution. `timestamp` is supplied by the caller and
/// passed through to subscribers untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStateChangeEvent {
  pub change:             StateChange,
  pub changed_by_user_id: Option<UserId>,
  pub timestamp:          String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn subject() -> FeatureStateSubject {
    FeatureStateSubject {
      feature_id:          1,
      environment_key:     "env-key".into(),
      identity_id:         42,
      identity_identifier: "user@example.com".into(),
    }
  }

  fn snapshot(enabled: bool, value: &str) -> FeatureStateSnapshot {
    FeatureStateSnapshot::from_parts(&subject(), Some(enabled), Some(value.into()))
      .unwrap()
  }

  #[test]
  fn snapshot_requires_enabled_or_value() {
    assert!(FeatureStateSnapshot::from_parts(&subject(), None, None).is_none());

    let only_enabled =
      FeatureStateSnapshot::from_parts(&subject(), Some(false), None).unwrap();
    assert_eq!(only_enabled.enabled, Some(false));
    assert!(only_enabled.value.is_none());

    let only_value =
      FeatureStateSnapshot::from_parts(
        &subject(),
        None,
        Some(FeatureStateValue::Integer(3)),
      )
      .unwrap();
    assert!(only_value.enabled.is_none());
    assert_eq!(only_value.value, Some(FeatureStateValue::Integer(3)));
  }

  #[test]
  fn neither_side_is_invalid() {
    let err = StateChange::from_sides(None, None).unwrap_err();
    assert!(matches!(err, Error::InvalidEvent));
  }

  #[test]
  fn new_only_is_an_update() {
    let change = StateChange::from_sides(None, Some(snapshot(true, "foo"))).unwrap();
    assert!(change.previous().is_none());
    assert!(change.new_state().is_some());
    assert_eq!(change.event_type(), WebhookEventType::FlagUpdated);
  }

  #[test]
  fn previous_only_is_a_deletion() {
    let change = StateChange::from_sides(Some(snapshot(true, "foo")), None).unwrap();
    assert!(change.previous().is_some());
    assert!(change.new_state().is_none());
    assert_eq!(change.event_type(), WebhookEventType::FlagDeleted);
  }

  #[test]
  fn both_sides_is_an_update() {
    let change = StateChange::from_sides(
      Some(snapshot(false, "foo")),
      Some(snapshot(true, "bar")),
    )
    .unwrap();
    assert_eq!(change.previous().unwrap().enabled, Some(false));
    assert_eq!(change.new_state().unwrap().enabled, Some(true));
    assert_eq!(change.latest().value, Some("bar".into()));
    assert_eq!(change.event_type(), WebhookEventType::FlagUpdated);
  }

  #[test]
  fn values_deserialise_untagged() {
    let values: Vec<Option<FeatureStateValue>> =
      serde_json::from_str(r#"[true, 12, 1.5, "foo", null]"#).unwrap();
    assert_eq!(
      values,
      vec![
        Some(FeatureStateValue::Boolean(true)),
        Some(FeatureStateValue::Integer(12)),
        Some(FeatureStateValue::Float(1.5)),
        Some(FeatureStateValue::String("foo".into())),
        None,
      ]
    );
  }
}
