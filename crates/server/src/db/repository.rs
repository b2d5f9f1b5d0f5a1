use medibridge_core::{
    AccessError, Identifier, Outcome, Projection, ResourceId, ResourceKind, validate,
};
use serde_json::Value as JsonValue;

use super::store::{SharedStore, StoreError};

/// How many matches to ask for when looking up by identifier.
/// One is expected; a second one means the uniqueness constraint was bypassed.
const IDENTIFIER_PROBE_LIMIT: usize = 2;

/// Read and create operations for one resource kind.
///
/// Holds no state besides the shared store handle, so it is cheap to build per
/// request and safe to use from many requests at once.
#[derive(Clone)]
pub struct ResourceRepository {
    store: SharedStore,
    kind: ResourceKind,
}

impl ResourceRepository {
    pub fn new(store: SharedStore, kind: ResourceKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Fetch a document by its external id
    pub async fn get_by_id(&self, raw_id: &str) -> Outcome<JsonValue> {
        let outcome = self.read_by_id(raw_id).await;
        self.record("get_by_id", &outcome);
        outcome
    }

    /// Fetch the single document carrying the `(system, value)` identifier
    pub async fn get_by_identifier(&self, system: &str, value: &str) -> Outcome<JsonValue> {
        let outcome = self.read_by_identifier(system, value).await;
        self.record("get_by_identifier", &outcome);
        outcome
    }

    /// Validate and store a new document, returning its assigned id
    pub async fn create(&self, payload: JsonValue) -> Outcome<ResourceId> {
        let outcome = self.write(payload).await;
        self.record("create", &outcome);
        outcome
    }

    async fn read_by_id(&self, raw_id: &str) -> Outcome<JsonValue> {
        let id = ResourceId::decode(raw_id).inspect_err(|e| {
            tracing::debug!(resource_type = %self.kind, error = %e, "Rejected malformed id");
        })?;

        tracing::debug!(resource_type = %self.kind, id = %id, "Reading resource by id");
        let document = self
            .store
            .find_by_id(self.kind, id)
            .await
            .map_err(|e| self.store_failure(e))?;

        document.ok_or_else(|| {
            tracing::info!(resource_type = %self.kind, id = %id, "Resource not found");
            AccessError::NotFound
        })
    }

    async fn read_by_identifier(&self, system: &str, value: &str) -> Outcome<JsonValue> {
        // validation never lets an empty half into the store
        if system.is_empty() || value.is_empty() {
            return Err(AccessError::NotFound);
        }

        let identifier = Identifier::new(system, value);
        tracing::debug!(resource_type = %self.kind, identifier = %identifier, "Reading resource by identifier");

        let mut matches = self
            .store
            .find_by_identifier(self.kind, &identifier, IDENTIFIER_PROBE_LIMIT)
            .await
            .map_err(|e| self.store_failure(e))?;

        match matches.len() {
            0 => {
                tracing::info!(resource_type = %self.kind, identifier = %identifier, "Resource not found");
                Err(AccessError::NotFound)
            }
            1 => Ok(matches.swap_remove(0)),
            n => {
                tracing::error!(
                    resource_type = %self.kind,
                    identifier = %identifier,
                    matches = n,
                    "Identifier is shared by several documents despite the uniqueness constraint"
                );
                Err(AccessError::InternalInconsistency(format!(
                    "{} identifier {} matches {} documents",
                    self.kind, identifier, n
                )))
            }
        }
    }

    async fn write(&self, payload: JsonValue) -> Outcome<ResourceId> {
        let resource = validate(self.kind, &payload).inspect_err(|e| {
            tracing::info!(resource_type = %self.kind, reason = %e, "Rejected invalid payload");
        })?;

        match resource.projection() {
            Projection::Patient { named } => {
                tracing::debug!(named, "Creating Patient");
            }
            Projection::MedicationRequest { status, medication } => {
                tracing::debug!(status = %status, medication, "Creating MedicationRequest");
            }
        }

        let id = ResourceId::generate();
        let document = resource.into_document(id);
        self.store.insert(&document).await.map_err(|e| match e {
            StoreError::DuplicateIdentifier => {
                tracing::info!(resource_type = %self.kind, "Identifier already in use");
                AccessError::DuplicateIdentifier
            }
            other => self.store_failure(other),
        })?;

        tracing::info!(resource_type = %self.kind, id = %id, "Resource created");
        Ok(id)
    }

    fn store_failure(&self, err: StoreError) -> AccessError {
        tracing::warn!(resource_type = %self.kind, error = %err, "Document store operation failed");
        err.into()
    }

    fn record<T>(&self, operation: &'static str, outcome: &Outcome<T>) {
        let label = match outcome {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::counter!(
            "resource_outcomes_total",
            "resource_type" => self.kind.resource_type(),
            "operation" => operation,
            "outcome" => label
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use medibridge_core::{NewDocument, ValidationError};
    use serde_json::json;

    use super::*;
    use crate::db::{DocumentStore, MemoryStore};

    /// Fails the test if the repository reaches the store
    struct UnreachableStore;

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn ping(&self) -> Result<(), StoreError> {
            panic!("store must not be reached");
        }

        async fn find_by_id(&self, _: ResourceKind, _: ResourceId) -> Result<Option<JsonValue>, StoreError> {
            panic!("store must not be reached");
        }

        async fn find_by_identifier(
            &self,
            _: ResourceKind,
            _: &Identifier,
            _: usize,
        ) -> Result<Vec<JsonValue>, StoreError> {
            panic!("store must not be reached");
        }

        async fn insert(&self, _: &NewDocument) -> Result<(), StoreError> {
            panic!("store must not be reached");
        }
    }

    /// Every operation fails as if the database were down
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn find_by_id(&self, _: ResourceKind, _: ResourceId) -> Result<Option<JsonValue>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn find_by_identifier(
            &self,
            _: ResourceKind,
            _: &Identifier,
            _: usize,
        ) -> Result<Vec<JsonValue>, StoreError> {
            Err(StoreError::Unavailable("statement timeout".to_string()))
        }

        async fn insert(&self, _: &NewDocument) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }
    }

    fn patients(store: Arc<MemoryStore>) -> ResourceRepository {
        ResourceRepository::new(store, ResourceKind::Patient)
    }

    fn jane() -> JsonValue {
        json!({"identifier": [{"system": "mrn", "value": "123"}], "name": "Jane Doe"})
    }

    #[tokio::test]
    async fn create_then_read_back() {
        let repo = patients(Arc::new(MemoryStore::new()));

        let id = repo.create(jane()).await.unwrap();

        let by_id = repo.get_by_id(&id.to_string()).await.unwrap();
        assert_eq!(by_id["id"], id.to_string());
        assert_eq!(by_id["resourceType"], "Patient");
        assert_eq!(by_id["name"], "Jane Doe");
        assert_eq!(by_id["identifier"], jane()["identifier"]);

        let by_identifier = repo.get_by_identifier("mrn", "123").await.unwrap();
        assert_eq!(by_identifier, by_id);
    }

    #[tokio::test]
    async fn reads_are_repeatable() {
        let repo = patients(Arc::new(MemoryStore::new()));
        let id = repo.create(jane()).await.unwrap().to_string();

        let first = repo.get_by_id(&id).await.unwrap();
        let second = repo.get_by_id(&id).await.unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_the_store() {
        let repo = ResourceRepository::new(Arc::new(UnreachableStore), ResourceKind::Patient);

        for raw in ["not-a-valid-id", "", "123", "67E55044-10B1-426F-9247-BB680E5FE0C8"] {
            assert_eq!(repo.get_by_id(raw).await, Err(AccessError::InvalidId));
        }
    }

    #[tokio::test]
    async fn invalid_payloads_never_reach_the_store() {
        let repo = ResourceRepository::new(Arc::new(UnreachableStore), ResourceKind::MedicationRequest);

        assert_eq!(
            repo.create(json!({})).await,
            Err(AccessError::Validation(ValidationError::MissingIdentifier))
        );
        assert_eq!(
            repo.create(json!({"identifier": [{"system": "rx", "value": "9"}]})).await,
            Err(AccessError::Validation(ValidationError::MissingField("status")))
        );
    }

    #[tokio::test]
    async fn missing_identifier_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let repo = patients(store.clone());

        let err = repo.create(json!({"name": "Jane Doe"})).await.unwrap_err();
        assert_eq!(err.to_string(), "validation failed: missing identifier");
        assert_eq!(store.len(ResourceKind::Patient), 0);
    }

    #[tokio::test]
    async fn unknown_id_and_identifier_are_not_found() {
        let repo = patients(Arc::new(MemoryStore::new()));
        repo.create(jane()).await.unwrap();

        let unknown = ResourceId::generate().to_string();
        assert_eq!(repo.get_by_id(&unknown).await, Err(AccessError::NotFound));
        assert_eq!(repo.get_by_identifier("mrn", "999").await, Err(AccessError::NotFound));
        assert_eq!(repo.get_by_identifier("ssn", "123").await, Err(AccessError::NotFound));
        assert_eq!(repo.get_by_identifier("", "").await, Err(AccessError::NotFound));
    }

    #[tokio::test]
    async fn duplicate_identifier_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let repo = patients(store.clone());
        repo.create(jane()).await.unwrap();

        let clash = json!({
            "identifier": [{"system": "other", "value": "1"}, {"system": "mrn", "value": "123"}],
            "name": "John Doe"
        });
        assert_eq!(repo.create(clash).await, Err(AccessError::DuplicateIdentifier));
        assert_eq!(store.len(ResourceKind::Patient), 1);
        // the non-clashing pair was not claimed either
        assert_eq!(repo.get_by_identifier("other", "1").await, Err(AccessError::NotFound));
    }

    #[tokio::test]
    async fn identifiers_are_scoped_per_kind() {
        let store = Arc::new(MemoryStore::new());
        let patients = ResourceRepository::new(store.clone(), ResourceKind::Patient);
        let requests = ResourceRepository::new(store, ResourceKind::MedicationRequest);

        let patient = patients.create(jane()).await.unwrap();
        let request = requests
            .create(json!({
                "identifier": [{"system": "mrn", "value": "123"}],
                "status": "active",
                "medicationReference": {"reference": "Medication/amoxicillin"}
            }))
            .await
            .unwrap();
        assert_ne!(patient, request);

        let found = requests.get_by_identifier("mrn", "123").await.unwrap();
        assert_eq!(found["resourceType"], "MedicationRequest");
        // ids do not leak across kinds
        assert_eq!(
            patients.get_by_id(&request.to_string()).await,
            Err(AccessError::NotFound)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_same_identifier() {
        let repo = patients(Arc::new(MemoryStore::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(jane()).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AccessError::DuplicateIdentifier) => duplicates += 1,
                Err(other) => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
    }

    #[tokio::test]
    async fn several_matches_are_an_inconsistency() {
        let store = Arc::new(MemoryStore::new());
        for _ in 0..2 {
            let id = ResourceId::generate();
            store.insert_unindexed(
                ResourceKind::Patient,
                id,
                json!({"id": id.to_string(), "identifier": [{"system": "mrn", "value": "123"}]}),
            );
        }

        let outcome = patients(store).get_by_identifier("mrn", "123").await;
        assert!(matches!(outcome, Err(AccessError::InternalInconsistency(_))));
    }

    #[tokio::test]
    async fn store_failures_are_unavailable() {
        let repo = ResourceRepository::new(Arc::new(DownStore), ResourceKind::Patient);

        let id = ResourceId::generate().to_string();
        assert!(matches!(repo.get_by_id(&id).await, Err(AccessError::StoreUnavailable(_))));
        assert!(matches!(
            repo.get_by_identifier("mrn", "123").await,
            Err(AccessError::StoreUnavailable(_))
        ));
        assert!(matches!(repo.create(jane()).await, Err(AccessError::StoreUnavailable(_))));
    }
}
