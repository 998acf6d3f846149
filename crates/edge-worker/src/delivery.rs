//! Outbound webhook delivery over HTTP.

use std::{sync::Arc, time::Duration};

use edge_core::{
  model::Environment,
  store::{WebhookDelivery, WebhookRegistry},
  webhook::{WebhookEventType, WebhookPayload},
};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DeliveryError {
  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),

  #[error("webhook registry error: {0}")]
  Registry(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The JSON body each subscriber receives.
#[derive(Serialize)]
struct WebhookBody<'a> {
  data:       &'a WebhookPayload,
  event_type: WebhookEventType,
}

/// POSTs payloads to every enabled webhook of an environment.
///
/// Subscribers are independent: a failed or rejected delivery is logged and
/// the remaining URLs are still attempted. Only a failure to list the
/// subscribers fails the call.
pub struct HttpWebhookDelivery<W> {
  client:   Client,
  registry: Arc<W>,
}

impl<W> HttpWebhookDelivery<W> {
  pub fn new(registry: Arc<W>, timeout: Duration) -> Result<Self, DeliveryError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, registry })
  }
}

impl<W: WebhookRegistry> WebhookDelivery for HttpWebhookDelivery<W> {
  type Error = DeliveryError;

  async fn call_environment_webhooks(
    &self,
    environment: &Environment,
    payload: &WebhookPayload,
    event_type: WebhookEventType,
  ) -> Result<(), DeliveryError> {
    let webhooks = self
      .registry
      .list_enabled_webhooks(environment.id)
      .await
      .map_err(|e| DeliveryError::Registry(Box::new(e)))?;

    let body = WebhookBody { data: payload, event_type };

    for webhook in &webhooks {
      match self.client.post(&webhook.url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
          debug!(url = %webhook.url, %event_type, "webhook delivered");
        }
        Ok(resp) => {
          warn!(url = %webhook.url, status = %resp.status(), "webhook rejected");
        }
        Err(e) => {
          warn!(url = %webhook.url, error = %e, "webhook delivery failed");
        }
      }
    }
    Ok(())
  }
}
