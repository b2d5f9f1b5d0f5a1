//! medibridge-core: resource types and access rules
//!
//! This crate holds everything about Patient and MedicationRequest
//! resources that does not need a database or a network: id encoding,
//! payload validation, the outcome taxonomy shared by every resource
//! operation, and the FHIR-shaped response bodies.

pub mod capability;
pub mod error;
pub mod id;
pub mod kind;
pub mod outcome;
pub mod resource;
pub mod validation;

pub use capability::CapabilityStatement;
pub use error::{AccessError, Outcome};
pub use id::{InvalidId, ResourceId};
pub use kind::ResourceKind;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use resource::{Identifier, NewDocument, Projection, ValidatedResource};
pub use validation::{ValidationError, validate};
