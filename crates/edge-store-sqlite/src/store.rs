//! [`SqliteStore`], the SQLite implementation of the edge collaborator
//! traits.

use std::{collections::HashSet, path::Path};

use edge_core::{
  document::IdentityDocument,
  model::{Environment, EnvironmentId, Feature, FeatureId, User, UserId},
  store::{
    FeatureSetResolver, IdentityDocumentStore, RelationalStore, WebhookRegistry,
  },
  webhook::{Webhook, WebhookId},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawWebhook, decode_document, encode_document, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An edge store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Relational writes ─────────────────────────────────────────────────────
  //
  // The tasks never call these; they exist so the relational side can be
  // seeded and changed by whatever owns it.

  pub async fn add_environment(&self, api_key: &str, name: &str) -> Result<Environment> {
    let api_key = api_key.to_owned();
    let name = name.to_owned();

    let environment = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO environments (api_key, name) VALUES (?1, ?2)",
          rusqlite::params![api_key, name],
        )?;
        Ok(Environment {
          id: conn.last_insert_rowid(),
          api_key,
          name,
        })
      })
      .await?;
    Ok(environment)
  }

  pub async fn add_feature(
    &self,
    name: &str,
    feature_type: &str,
    description: Option<&str>,
  ) -> Result<Feature> {
    let name = name.to_owned();
    let feature_type = feature_type.to_owned();
    let description = description.map(str::to_owned);

    let feature = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO features (name, type, description) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, feature_type, description],
        )?;
        Ok(Feature {
          id: conn.last_insert_rowid(),
          name,
          feature_type,
          description,
        })
      })
      .await?;
    Ok(feature)
  }

  /// Make `feature_id` valid for `environment_id`. Adding an existing state
  /// is a no-op.
  pub async fn add_feature_state(
    &self,
    environment_id: EnvironmentId,
    feature_id: FeatureId,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO feature_states (environment_id, feature_id)
           VALUES (?1, ?2)",
          rusqlite::params![environment_id, feature_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete a feature and, through the cascade, its states in every
  /// environment. Identity documents are left alone.
  pub async fn delete_feature(&self, feature_id: FeatureId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM features WHERE id = ?1",
          rusqlite::params![feature_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn add_user(&self, email: &str) -> Result<User> {
    let email = email.to_owned();

    let user = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (email) VALUES (?1)",
          rusqlite::params![email],
        )?;
        Ok(User {
          id: conn.last_insert_rowid(),
          email,
        })
      })
      .await?;
    Ok(user)
  }

  pub async fn add_webhook(
    &self,
    environment_id: EnvironmentId,
    url: &str,
    enabled: bool,
  ) -> Result<Webhook> {
    let url = url.to_owned();

    let webhook = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO webhooks (environment_id, url, enabled) VALUES (?1, ?2, ?3)",
          rusqlite::params![environment_id, url, enabled],
        )?;
        Ok(Webhook {
          id: conn.last_insert_rowid(),
          environment_id,
          url,
          enabled,
        })
      })
      .await?;
    Ok(webhook)
  }

  pub async fn set_webhook_enabled(&self, id: WebhookId, enabled: bool) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE webhooks SET enabled = ?2 WHERE id = ?1",
          rusqlite::params![id, enabled],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RelationalStore impl ────────────────────────────────────────────────────

impl RelationalStore for SqliteStore {
  type Error = crate::Error;

  async fn get_environment_by_api_key(
    &self,
    api_key: &str,
  ) -> Result<Option<Environment>> {
    let api_key = api_key.to_owned();

    let environment = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, api_key, name FROM environments WHERE api_key = ?1",
            rusqlite::params![api_key],
            |row| {
              Ok(Environment {
                id:      row.get(0)?,
                api_key: row.get(1)?,
                name:    row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(environment)
  }

  async fn get_feature(&self, id: FeatureId) -> Result<Option<Feature>> {
    let feature = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name, type, description FROM features WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(Feature {
                id:           row.get(0)?,
                name:         row.get(1)?,
                feature_type: row.get(2)?,
                description:  row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(feature)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let user = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, email FROM users WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(User {
                id:    row.get(0)?,
                email: row.get(1)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(user)
  }
}

// ─── WebhookRegistry impl ────────────────────────────────────────────────────

impl WebhookRegistry for SqliteStore {
  type Error = crate::Error;

  async fn list_enabled_webhooks(
    &self,
    environment_id: EnvironmentId,
  ) -> Result<Vec<Webhook>> {
    let raws: Vec<RawWebhook> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, environment_id, url, enabled FROM webhooks
           WHERE environment_id = ?1 AND enabled = 1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![environment_id], |row| {
            Ok(RawWebhook {
              id:             row.get(0)?,
              environment_id: row.get(1)?,
              url:            row.get(2)?,
              enabled:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawWebhook::into_webhook).collect())
  }
}

// ─── FeatureSetResolver impl ─────────────────────────────────────────────────

impl FeatureSetResolver for SqliteStore {
  type Error = crate::Error;

  async fn valid_feature_ids(
    &self,
    environment_api_key: &str,
  ) -> Result<HashSet<FeatureId>> {
    let api_key = environment_api_key.to_owned();

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT fs.feature_id
           FROM feature_states fs
           JOIN environments e ON e.id = fs.environment_id
           WHERE e.api_key = ?1",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![api_key], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<FeatureId>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }
}

// ─── IdentityDocumentStore impl ──────────────────────────────────────────────

impl IdentityDocumentStore for SqliteStore {
  type Error = crate::Error;

  async fn get_item_from_uuid(
    &self,
    identity_uuid: Uuid,
  ) -> Result<Option<IdentityDocument>> {
    let id_str = encode_uuid(identity_uuid);

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT document FROM identity_documents WHERE identity_uuid = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|s| decode_document(identity_uuid, &s))
      .transpose()
  }

  async fn put_item(&self, document: &IdentityDocument) -> Result<()> {
    let id_str = encode_uuid(document.identity_uuid);
    let api_key = document.environment_api_key.clone();
    let body = encode_document(document)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO identity_documents
             (identity_uuid, environment_api_key, document)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, api_key, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
