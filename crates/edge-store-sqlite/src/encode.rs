//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings. Identity documents are
//! stored as compact JSON; booleans as `0`/`1` integers.

use edge_core::{document::IdentityDocument, webhook::Webhook};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

// ─── IdentityDocument ─────────────────────────────────────────────────────────

pub fn encode_document(document: &IdentityDocument) -> Result<String> {
  Ok(serde_json::to_string(document)?)
}

/// Decode the JSON body stored under `identity_uuid`, rejecting a body whose
/// own key disagrees with the row it was read from.
pub fn decode_document(identity_uuid: Uuid, s: &str) -> Result<IdentityDocument> {
  let document: IdentityDocument = serde_json::from_str(s)?;
  if document.identity_uuid != identity_uuid {
    return Err(Error::MismatchedDocument {
      stored: identity_uuid,
      found:  document.identity_uuid,
    });
  }
  Ok(document)
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A `webhooks` row as read from SQLite.
pub struct RawWebhook {
  pub id:             i64,
  pub environment_id: i64,
  pub url:            String,
  pub enabled:        i64,
}

impl RawWebhook {
  pub fn into_webhook(self) -> Webhook {
    Webhook {
      id:             self.id,
      environment_id: self.environment_id,
      url:            self.url,
      enabled:        self.enabled != 0,
    }
  }
}
