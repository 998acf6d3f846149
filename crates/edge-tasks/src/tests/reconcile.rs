use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use edge_core::document::IdentityDocument;
use serde_json::{Value, json};
use uuid::Uuid;

use super::doubles::{MemoryDocuments, MemoryRelational};
use crate::{Error, IdentityReconciler};

const API_KEY: &str = "ser.env-key";

fn feature_state(feature_id: Value, name: &str) -> Value {
  json!({
    "feature_state_value": format!("{name}_value"),
    "featurestate_uuid": Uuid::new_v4(),
    "django_id": 1,
    "feature": { "name": name, "type": "STANDARD", "id": feature_id },
    "enabled": true,
  })
}

fn identity_document(features: Vec<Value>) -> IdentityDocument {
  serde_json::from_value(json!({
    "composite_key": format!("{API_KEY}_test-identity"),
    "identity_traits": [],
    "identity_features": features,
    "identifier": "test-identity",
    "environment_api_key": API_KEY,
    "created_date": "2024-03-19T09:41:22.974595+00:00",
    "identity_uuid": Uuid::new_v4(),
    "django_id": null,
  }))
  .unwrap()
}

fn valid_features(ids: &[i64]) -> Arc<MemoryRelational> {
  Arc::new(MemoryRelational {
    feature_states: HashMap::from([(
      API_KEY.to_owned(),
      ids.iter().copied().collect::<HashSet<_>>(),
    )]),
    ..Default::default()
  })
}

fn reconciler(
  documents: &Arc<MemoryDocuments>,
  features: Arc<MemoryRelational>,
) -> IdentityReconciler<MemoryDocuments, MemoryRelational> {
  IdentityReconciler::new(Arc::clone(documents), features)
}

fn ids(document: &IdentityDocument) -> Vec<Option<i64>> {
  document
    .identity_features
    .iter()
    .map(|fs| fs.feature_id())
    .collect()
}

// ─── Pruning ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn removes_deleted_features() {
  let document_without_fs = identity_document(vec![feature_state(json!(1), "feature_1")]);
  let identity_uuid = document_without_fs.identity_uuid;

  // Add a feature to the identity that does not exist in the environment.
  let mut document = document_without_fs.clone();
  let stale = feature_state(json!(99), "feature_that_does_not_exists");
  document
    .identity_features
    .push(serde_json::from_value(stale).unwrap());

  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[1]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  assert_eq!(*documents.gets.lock().unwrap(), vec![identity_uuid]);
  assert_eq!(documents.puts(), vec![document_without_fs]);
}

#[tokio::test]
async fn keeps_only_features_in_the_authoritative_set() {
  let document = identity_document(vec![
    feature_state(json!(1), "a"),
    feature_state(json!(2), "b"),
  ]);
  let identity_uuid = document.identity_uuid;
  let expected_a = document.identity_features[0].clone();
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[1]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  let stored = documents.stored(identity_uuid).unwrap();
  assert_eq!(stored.identity_features, vec![expected_a]);
}

#[tokio::test]
async fn empty_document_is_written_back_unchanged() {
  let document = identity_document(vec![]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document.clone()));

  reconciler(&documents, valid_features(&[1, 2]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  assert_eq!(documents.puts(), vec![document]);
  assert!(documents.stored(identity_uuid).unwrap().identity_features.is_empty());
}

#[tokio::test]
async fn unchanged_document_is_still_written() {
  let document = identity_document(vec![
    feature_state(json!(1), "a"),
    feature_state(json!(2), "b"),
  ]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document.clone()));

  reconciler(&documents, valid_features(&[1, 2, 3]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  assert_eq!(documents.puts(), vec![document]);
}

#[tokio::test]
async fn entries_without_a_usable_back_reference_are_dropped() {
  let document = identity_document(vec![
    feature_state(json!("1"), "string_id"),
    json!({ "enabled": true, "feature_state_value": null }),
    feature_state(json!(1), "a"),
  ]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[1]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  assert_eq!(ids(&documents.stored(identity_uuid).unwrap()), vec![Some(1)]);
}

#[tokio::test]
async fn unknown_environment_prunes_everything() {
  let document = identity_document(vec![feature_state(json!(1), "a")]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, Arc::new(MemoryRelational::default()))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  assert!(documents.stored(identity_uuid).unwrap().identity_features.is_empty());
}

#[tokio::test]
async fn unmodelled_attributes_are_preserved() {
  let document = identity_document(vec![
    feature_state(json!(1), "a"),
    feature_state(json!(2), "b"),
  ]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[2]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  let stored = serde_json::to_value(documents.stored(identity_uuid).unwrap()).unwrap();
  assert_eq!(stored["composite_key"], format!("{API_KEY}_test-identity"));
  assert_eq!(stored["created_date"], "2024-03-19T09:41:22.974595+00:00");
  assert_eq!(stored["identity_features"][0]["django_id"], 1);
  assert_eq!(stored["identity_features"][0]["feature"]["name"], "b");
}

#[tokio::test]
async fn kept_entries_are_stored_exactly_as_read() {
  let features = vec![
    json!({
      "feature": { "id": 1, "name": "a", "type": "STANDARD", "tags": ["beta"] },
      "django_id": 5,
    }),
    feature_state(json!(2), "b"),
    json!({ "feature": { "id": 3 }, "enabled": false }),
  ];
  let document = identity_document(features.clone());
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[1, 3]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  let stored = serde_json::to_value(documents.stored(identity_uuid).unwrap()).unwrap();
  assert_eq!(stored["identity_features"], json!([features[0], features[2]]));
}

#[tokio::test]
async fn malformed_entries_do_not_block_the_pass() {
  let kept = json!({
    "feature": { "id": 1, "name": "a", "type": "STANDARD" },
    "enabled": null,
    "featurestate_uuid": "legacy-id",
  });
  let stale = json!({
    "feature": { "id": 2, "name": "b", "type": "STANDARD" },
    "enabled": "yes",
    "feature_state_value": [1, 2],
  });
  let document = identity_document(vec![
    kept.clone(),
    stale,
    json!({ "feature": "garbage", "enabled": null }),
  ]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));

  reconciler(&documents, valid_features(&[1]))
    .reconcile(identity_uuid)
    .await
    .unwrap();

  let stored = serde_json::to_value(documents.stored(identity_uuid).unwrap()).unwrap();
  assert_eq!(stored["identity_features"], json!([kept]));
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_runs_converge() {
  let document = identity_document(vec![
    feature_state(json!(1), "a"),
    feature_state(json!(2), "b"),
    feature_state(json!(3), "c"),
  ]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments::with(document));
  let reconciler = reconciler(&documents, valid_features(&[1, 3]));

  reconciler.reconcile(identity_uuid).await.unwrap();
  let after_first = documents.stored(identity_uuid).unwrap();

  reconciler.reconcile(identity_uuid).await.unwrap();
  let after_second = documents.stored(identity_uuid).unwrap();

  assert_eq!(after_first, after_second);
  assert_eq!(ids(&after_second), vec![Some(1), Some(3)]);
  assert_eq!(documents.puts().len(), 2);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_document_is_not_found() {
  let documents = Arc::new(MemoryDocuments::default());
  let identity_uuid = Uuid::new_v4();

  let err = reconciler(&documents, valid_features(&[1]))
    .reconcile(identity_uuid)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::IdentityNotFound(id) if id == identity_uuid));
  assert!(documents.puts().is_empty());
}

#[tokio::test]
async fn write_failures_are_propagated() {
  let document = identity_document(vec![feature_state(json!(1), "a")]);
  let identity_uuid = document.identity_uuid;
  let documents = Arc::new(MemoryDocuments {
    fail_puts: true,
    ..MemoryDocuments::with(document.clone())
  });

  let err = reconciler(&documents, valid_features(&[]))
    .reconcile(identity_uuid)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Store(_)));
  assert_eq!(documents.stored(identity_uuid), Some(document));
}
