//! Typed views of resource payloads past the validation boundary

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::id::ResourceId;
use crate::kind::ResourceKind;

/// Business identifier: a `(system, value)` pair distinct from the primary key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.system, self.value)
    }
}

/// Kind-specific fields extracted during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Patient {
        named: bool,
    },
    MedicationRequest {
        status: String,
        /// Which `medication[x]` key carried the medication
        medication: &'static str,
    },
}

/// A payload that passed validation, ready to be assigned an id
#[derive(Debug, Clone)]
pub struct ValidatedResource {
    kind: ResourceKind,
    identifiers: Vec<Identifier>,
    projection: Projection,
    body: Map<String, JsonValue>,
}

impl ValidatedResource {
    pub(crate) fn new(
        kind: ResourceKind,
        identifiers: Vec<Identifier>,
        projection: Projection,
        body: Map<String, JsonValue>,
    ) -> Self {
        Self {
            kind,
            identifiers,
            projection,
            body,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Distinct identifier pairs, in first-seen order
    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Stamp the assigned id and the kind's `resourceType` onto the payload.
    ///
    /// A client-supplied `id` is overwritten.
    pub fn into_document(self, id: ResourceId) -> NewDocument {
        let mut body = self.body;
        body.insert("id".to_string(), JsonValue::String(id.to_string()));
        body.insert(
            "resourceType".to_string(),
            JsonValue::String(self.kind.resource_type().to_string()),
        );

        NewDocument {
            id,
            kind: self.kind,
            identifiers: self.identifiers,
            body: JsonValue::Object(body),
        }
    }
}

/// A document about to be inserted into its kind's collection
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub identifiers: Vec<Identifier>,
    pub body: JsonValue,
}
