//! Error type for `edge-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored document's primary key does not match its body.
  #[error("document {stored} holds identity_uuid {found}")]
  MismatchedDocument {
    stored: uuid::Uuid,
    found:  uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
