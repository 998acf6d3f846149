//! Error type for `edge-tasks`.

use edge_core::model::{FeatureId, UserId};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] edge_core::Error),

  #[error("environment not found: {0}")]
  EnvironmentNotFound(String),

  #[error("feature not found: {0}")]
  FeatureNotFound(FeatureId),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("identity document not found: {0}")]
  IdentityNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("delivery error: {0}")]
  Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::EnvironmentNotFound(_)
        | Self::FeatureNotFound(_)
        | Self::UserNotFound(_)
        | Self::IdentityNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
