//! In-process document store with the same uniqueness rules as PostgreSQL.
//!
//! Used by the router and repository tests; nothing is persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use medibridge_core::{Identifier, NewDocument, ResourceId, ResourceKind};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use super::store::{DocumentStore, StoreError};

#[derive(Default)]
struct MemoryCollection {
    documents: HashMap<ResourceId, JsonValue>,
    identifiers: HashMap<Identifier, ResourceId>,
}

/// A [`DocumentStore`] kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<ResourceKind, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored for `kind`
    pub fn len(&self, kind: ResourceKind) -> usize {
        self.collections
            .lock()
            .get(&kind)
            .map_or(0, |c| c.documents.len())
    }

    /// Store a document without touching the identifier index
    #[cfg(test)]
    pub(crate) fn insert_unindexed(&self, kind: ResourceKind, id: ResourceId, body: JsonValue) {
        self.collections
            .lock()
            .entry(kind)
            .or_default()
            .documents
            .insert(id, body);
    }
}

fn has_identifier(document: &JsonValue, identifier: &Identifier) -> bool {
    document
        .get("identifier")
        .and_then(JsonValue::as_array)
        .is_some_and(|elements| {
            elements.iter().any(|e| {
                e.get("system").and_then(JsonValue::as_str) == Some(identifier.system.as_str())
                    && e.get("value").and_then(JsonValue::as_str) == Some(identifier.value.as_str())
            })
        })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<JsonValue>, StoreError> {
        Ok(self
            .collections
            .lock()
            .get(&kind)
            .and_then(|c| c.documents.get(&id).cloned()))
    }

    async fn find_by_identifier(
        &self,
        kind: ResourceKind,
        identifier: &Identifier,
        limit: usize,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let collections = self.collections.lock();
        let Some(collection) = collections.get(&kind) else {
            return Ok(Vec::new());
        };

        Ok(collection
            .documents
            .values()
            .filter(|doc| has_identifier(doc, identifier))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, document: &NewDocument) -> Result<(), StoreError> {
        let mut collections = self.collections.lock();
        let collection = collections.entry(document.kind).or_default();

        if document
            .identifiers
            .iter()
            .any(|identifier| collection.identifiers.contains_key(identifier))
        {
            return Err(StoreError::DuplicateIdentifier);
        }
        if collection.documents.contains_key(&document.id) {
            return Err(StoreError::Unavailable(format!(
                "primary key {} already in use",
                document.id
            )));
        }

        for identifier in &document.identifiers {
            collection
                .identifiers
                .insert(identifier.clone(), document.id);
        }
        collection
            .documents
            .insert(document.id, document.body.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use medibridge_core::validate;
    use serde_json::json;

    use super::*;

    fn document(kind: ResourceKind, system: &str, value: &str) -> NewDocument {
        validate(kind, &json!({
            "identifier": [{"system": system, "value": value}],
            "status": "active",
            "medication": {"reference": "Medication/1"}
        }))
        .unwrap()
        .into_document(ResourceId::generate())
    }

    #[tokio::test]
    async fn rejects_second_use_of_identifier() {
        let store = MemoryStore::new();
        store.insert(&document(ResourceKind::Patient, "mrn", "1")).await.unwrap();

        let err = store
            .insert(&document(ResourceKind::Patient, "mrn", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier));
        assert_eq!(store.len(ResourceKind::Patient), 1);
    }

    #[tokio::test]
    async fn uniqueness_is_per_kind() {
        let store = MemoryStore::new();
        store.insert(&document(ResourceKind::Patient, "mrn", "1")).await.unwrap();
        store
            .insert(&document(ResourceKind::MedicationRequest, "mrn", "1"))
            .await
            .unwrap();

        assert_eq!(store.len(ResourceKind::Patient), 1);
        assert_eq!(store.len(ResourceKind::MedicationRequest), 1);
    }

    #[tokio::test]
    async fn finds_by_any_identifier_element() {
        let store = MemoryStore::new();
        let doc = validate(ResourceKind::Patient, &json!({
            "identifier": [
                {"system": "mrn", "value": "1"},
                {"system": "ssn", "value": "000-11-2222", "use": "official"}
            ]
        }))
        .unwrap()
        .into_document(ResourceId::generate());
        store.insert(&doc).await.unwrap();

        let found = store
            .find_by_identifier(ResourceKind::Patient, &Identifier::new("ssn", "000-11-2222"), 2)
            .await
            .unwrap();
        assert_eq!(found, vec![doc.body]);

        let missing = store
            .find_by_identifier(ResourceKind::Patient, &Identifier::new("ssn", "1"), 2)
            .await
            .unwrap();
        assert!(missing.is_empty());
    }
}
