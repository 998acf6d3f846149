//! Webhook dispatch for identity feature-state changes.

use std::sync::Arc;

use edge_core::{
  model::{FeatureId, IdentityId, UserId},
  state::{
    FeatureStateChangeEvent, FeatureStateSnapshot, FeatureStateSubject,
    FeatureStateValue, StateChange,
  },
  store::{FeatureStateFormatter, RelationalStore, WebhookDelivery, WebhookRegistry},
};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, field::Empty, info};

use crate::{Error, Result, payload, payload::DefaultFeatureStateFormatter};

// ─── Request ─────────────────────────────────────────────────────────────────

/// The flat argument list a change is queued with. Either side may be
/// omitted, but not both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStateChangeRequest {
  pub feature_id:             FeatureId,
  pub environment_api_key:    String,
  pub identity_id:            IdentityId,
  pub identity_identifier:    String,
  #[serde(default)]
  pub changed_by_user_id:     Option<UserId>,
  pub timestamp:              String,
  #[serde(default)]
  pub previous_enabled_state: Option<bool>,
  #[serde(default)]
  pub previous_value:         Option<FeatureStateValue>,
  #[serde(default)]
  pub new_enabled_state:      Option<bool>,
  #[serde(default)]
  pub new_value:              Option<FeatureStateValue>,
}

impl FeatureStateChangeRequest {
  /// Pair up the optional sides into a typed event.
  pub fn into_event(self) -> Result<FeatureStateChangeEvent> {
    let subject = FeatureStateSubject {
      feature_id:          self.feature_id,
      environment_key:     self.environment_api_key,
      identity_id:         self.identity_id,
      identity_identifier: self.identity_identifier,
    };
    let previous = FeatureStateSnapshot::from_parts(
      &subject,
      self.previous_enabled_state,
      self.previous_value,
    );
    let new =
      FeatureStateSnapshot::from_parts(&subject, self.new_enabled_state, self.new_value);

    Ok(FeatureStateChangeEvent {
      change:             StateChange::from_sides(previous, new)?,
      changed_by_user_id: self.changed_by_user_id,
      timestamp:          self.timestamp,
    })
  }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Resolves the models behind a change and hands one payload to the delivery
/// collaborator, provided the environment has at least one enabled webhook.
pub struct WebhookDispatcher<R, W, D, F = DefaultFeatureStateFormatter> {
  relational: Arc<R>,
  registry:   Arc<W>,
  delivery:   Arc<D>,
  formatter:  Arc<F>,
}

impl<R, W, D, F> Clone for WebhookDispatcher<R, W, D, F> {
  fn clone(&self) -> Self {
    Self {
      relational: Arc::clone(&self.relational),
      registry:   Arc::clone(&self.registry),
      delivery:   Arc::clone(&self.delivery),
      formatter:  Arc::clone(&self.formatter),
    }
  }
}

impl<R, W, D> WebhookDispatcher<R, W, D> {
  pub fn new(relational: Arc<R>, registry: Arc<W>, delivery: Arc<D>) -> Self {
    Self {
      relational,
      registry,
      delivery,
      formatter: Arc::new(DefaultFeatureStateFormatter),
    }
  }
}

impl<R, W, D, F> WebhookDispatcher<R, W, D, F> {
  /// Swap the fragment formatter.
  pub fn with_formatter<G>(self, formatter: Arc<G>) -> WebhookDispatcher<R, W, D, G> {
    WebhookDispatcher {
      relational: self.relational,
      registry: self.registry,
      delivery: self.delivery,
      formatter,
    }
  }
}

impl<R, W, D, F> WebhookDispatcher<R, W, D, F>
where
  R: RelationalStore,
  W: WebhookRegistry,
  D: WebhookDelivery,
  F: FeatureStateFormatter,
{
  /// Entry point for queued changes. An empty request fails with
  /// [`edge_core::Error::InvalidEvent`] before any lookup is made.
  pub async fn dispatch_for_feature_state_change(
    &self,
    request: FeatureStateChangeRequest,
  ) -> Result<()> {
    let event = request.into_event()?;
    self.dispatch(&event).await
  }

  /// Deliver `event` to the environment's subscribers.
  ///
  /// Environment and feature lookups always happen; the acting user is only
  /// resolved once there is somebody to notify.
  #[tracing::instrument(skip_all, fields(feature_id = Empty, environment = Empty))]
  pub async fn dispatch(&self, event: &FeatureStateChangeEvent) -> Result<()> {
    let subject = event.change.latest();
    let span = Span::current();
    span.record("feature_id", subject.feature_id);
    span.record("environment", subject.environment_key.as_str());

    let environment = self
      .relational
      .get_environment_by_api_key(&subject.environment_key)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EnvironmentNotFound(subject.environment_key.clone()))?;

    let feature = self
      .relational
      .get_feature(subject.feature_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::FeatureNotFound(subject.feature_id))?;

    let event_type = event.change.event_type();

    let webhooks = self
      .registry
      .list_enabled_webhooks(environment.id)
      .await
      .map_err(Error::store)?;
    if webhooks.is_empty() {
      debug!("no enabled webhooks for environment; nothing to send");
      return Ok(());
    }

    let changed_by = match event.changed_by_user_id {
      Some(user_id) => {
        let user = self
          .relational
          .get_user(user_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::UserNotFound(user_id))?;
        Some(user.email)
      }
      None => None,
    };

    let payload = payload::assemble(
      self.formatter.as_ref(),
      &feature,
      &environment,
      event,
      changed_by,
    );

    self
      .delivery
      .call_environment_webhooks(&environment, &payload, event_type)
      .await
      .map_err(|e| Error::Delivery(Box::new(e)))?;

    info!(%event_type, subscribers = webhooks.len(), "feature state webhook dispatched");
    Ok(())
  }
}
