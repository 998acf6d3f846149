//! Identity document reconciliation.
//!
//! Brings an edge identity document back in line with the relational store
//! by dropping overrides for features that no longer exist in the identity's
//! environment. Every pass recomputes the full valid set and overwrites the
//! whole document, so repeated or overlapping runs converge on the same
//! result.

use std::sync::Arc;

use edge_core::store::{FeatureSetResolver, IdentityDocumentStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result};

pub struct IdentityReconciler<S, R> {
  documents: Arc<S>,
  features:  Arc<R>,
}

impl<S, R> Clone for IdentityReconciler<S, R> {
  fn clone(&self) -> Self {
    Self {
      documents: Arc::clone(&self.documents),
      features:  Arc::clone(&self.features),
    }
  }
}

impl<S, R> IdentityReconciler<S, R>
where
  S: IdentityDocumentStore,
  R: FeatureSetResolver,
{
  pub fn new(documents: Arc<S>, features: Arc<R>) -> Self {
    Self { documents, features }
  }

  /// Prune the document for `identity_uuid` and write it back.
  ///
  /// The document is written even when nothing was removed. Only existing
  /// entries are ever dropped; missing features are never added.
  #[tracing::instrument(skip(self))]
  pub async fn reconcile(&self, identity_uuid: Uuid) -> Result<()> {
    let mut document = self
      .documents
      .get_item_from_uuid(identity_uuid)
      .await
      .map_err(Error::store)?
      .ok_or(Error::IdentityNotFound(identity_uuid))?;

    let valid = self
      .features
      .valid_feature_ids(&document.environment_api_key)
      .await
      .map_err(Error::store)?;

    let dropped = document.prune_features(&valid);
    for entry in &dropped {
      debug!(
        feature_id = ?entry.feature_id(),
        featurestate_uuid = ?entry.featurestate_uuid(),
        "dropping identity override for missing feature"
      );
    }

    self
      .documents
      .put_item(&document)
      .await
      .map_err(Error::store)?;

    info!(
      removed = dropped.len(),
      remaining = document.identity_features.len(),
      "identity document features synced"
    );
    Ok(())
  }
}
