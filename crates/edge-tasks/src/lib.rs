//! The edge identity tasks.
//!
//! - [`dispatch`] turns a feature-state change for an identity into one
//!   webhook delivery for the environment's subscribers.
//! - [`reconcile`] prunes an identity document down to the features that
//!   still exist for its environment.
//!
//! Both are single-shot and stateless; scheduling, timeouts and retries are
//! owned by whatever runs them.

pub mod dispatch;
pub mod error;
pub mod payload;
pub mod reconcile;

pub use dispatch::{FeatureStateChangeRequest, WebhookDispatcher};
pub use error::{Error, Result};
pub use payload::DefaultFeatureStateFormatter;
pub use reconcile::IdentityReconciler;

#[cfg(test)]
mod tests;
