//! Structural pre-write checks for resource payloads.
//!
//! Checks run in a fixed order and stop at the first failure, so the reported
//! reason for a given payload is always the same.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::kind::ResourceKind;
use crate::resource::{Identifier, Projection, ValidatedResource};

/// Keys that may carry a MedicationRequest's medication
const MEDICATION_KEYS: [&str; 3] = [
    "medication",
    "medicationReference",
    "medicationCodeableConcept",
];

/// Why a payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing identifier")]
    MissingIdentifier,

    #[error("identifier must be a non-empty array")]
    EmptyIdentifier,

    #[error("identifier[{index}].{field} must be a non-empty string")]
    MalformedIdentifier { index: usize, field: &'static str },

    #[error("resourceType must be '{expected}', got {found}")]
    ResourceTypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Validate `payload` as a resource of `kind`.
pub fn validate(kind: ResourceKind, payload: &JsonValue) -> Result<ValidatedResource, ValidationError> {
    let body = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    let identifiers = identifiers(body)?;
    check_resource_type(kind, body)?;

    let projection = match kind {
        ResourceKind::Patient => patient(body)?,
        ResourceKind::MedicationRequest => medication_request(body)?,
    };

    Ok(ValidatedResource::new(kind, identifiers, projection, body.clone()))
}

fn identifiers(body: &Map<String, JsonValue>) -> Result<Vec<Identifier>, ValidationError> {
    let raw = match body.get("identifier") {
        None | Some(JsonValue::Null) => return Err(ValidationError::MissingIdentifier),
        Some(raw) => raw,
    };

    let elements = match raw.as_array() {
        Some(elements) if !elements.is_empty() => elements,
        _ => return Err(ValidationError::EmptyIdentifier),
    };

    let mut identifiers: Vec<Identifier> = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let system = required_str(element, "system")
            .ok_or(ValidationError::MalformedIdentifier { index, field: "system" })?;
        let value = required_str(element, "value")
            .ok_or(ValidationError::MalformedIdentifier { index, field: "value" })?;

        let identifier = Identifier::new(system, value);
        // a repeated pair inside one payload is not a conflict with itself
        if !identifiers.contains(&identifier) {
            identifiers.push(identifier);
        }
    }

    Ok(identifiers)
}

fn check_resource_type(kind: ResourceKind, body: &Map<String, JsonValue>) -> Result<(), ValidationError> {
    match body.get("resourceType") {
        None => Ok(()),
        Some(JsonValue::String(found)) if found == kind.resource_type() => Ok(()),
        Some(found) => Err(ValidationError::ResourceTypeMismatch {
            expected: kind.resource_type(),
            found: found.to_string(),
        }),
    }
}

fn patient(body: &Map<String, JsonValue>) -> Result<Projection, ValidationError> {
    // identifier-only patients are allowed, but a name that is sent must say something
    let named = match body.get("name") {
        None => false,
        Some(name) if is_blank(name) => return Err(ValidationError::MissingField("name")),
        Some(_) => true,
    };

    Ok(Projection::Patient { named })
}

fn medication_request(body: &Map<String, JsonValue>) -> Result<Projection, ValidationError> {
    let status = body
        .get("status")
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::MissingField("status"))?;

    let medication = MEDICATION_KEYS
        .into_iter()
        .find(|key| body.get(*key).is_some_and(|v| !is_blank(v)))
        .ok_or(ValidationError::MissingField("medication"))?;

    Ok(Projection::MedicationRequest {
        status: status.to_string(),
        medication,
    })
}

fn required_str<'a>(element: &'a JsonValue, field: &str) -> Option<&'a str> {
    element
        .get(field)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(fields) => fields.is_empty(),
        _ => false,
    }
}
