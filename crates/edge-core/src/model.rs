//! Relational models read by the edge tasks.
//!
//! These records are owned by the relational store. The tasks only ever read
//! them; they are never written back from this subsystem.

use serde::{Deserialize, Serialize};

pub type EnvironmentId = i64;
pub type FeatureId = i64;
pub type IdentityId = i64;
pub type UserId = i64;

// ─── Environment ─────────────────────────────────────────────────────────────

/// An environment, addressed externally by its client-side API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
  pub id:      EnvironmentId,
  pub api_key: String,
  pub name:    String,
}

// ─── Feature ─────────────────────────────────────────────────────────────────

/// A feature flag definition. `feature_type` is the wire string, e.g.
/// `"STANDARD"` or `"MULTIVARIATE"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
  pub id:           FeatureId,
  pub name:         String,
  #[serde(rename = "type")]
  pub feature_type: String,
  pub description:  Option<String>,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// The user attributed with a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:    UserId,
  pub email: String,
}
