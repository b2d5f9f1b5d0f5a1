use thiserror::Error;

use crate::id::InvalidId;
use crate::outcome::{IssueType, OperationOutcome};
use crate::validation::ValidationError;

/// Result of a resource access operation. `Ok` is the success case.
pub type Outcome<T> = Result<T, AccessError>;

/// Every way a resource access operation can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("invalid resource id")]
    InvalidId,

    #[error("resource not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("identifier already assigned to another resource")]
    DuplicateIdentifier,

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl AccessError {
    /// Stable snake_case name, used as a metrics label
    pub fn label(&self) -> &'static str {
        match self {
            AccessError::InvalidId => "invalid_id",
            AccessError::NotFound => "not_found",
            AccessError::Validation(_) => "validation_error",
            AccessError::DuplicateIdentifier => "duplicate_identifier",
            AccessError::StoreUnavailable(_) => "store_unavailable",
            AccessError::InternalInconsistency(_) => "internal_inconsistency",
        }
    }

    /// True for failures caused by the request rather than the infrastructure
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AccessError::StoreUnavailable(_) | AccessError::InternalInconsistency(_)
        )
    }

    /// FHIR issue type describing this failure
    pub fn issue_type(&self) -> IssueType {
        match self {
            AccessError::InvalidId => IssueType::Value,
            AccessError::NotFound => IssueType::NotFound,
            AccessError::Validation(ValidationError::NotAnObject) => IssueType::Structure,
            AccessError::Validation(ValidationError::ResourceTypeMismatch { .. }) => IssueType::Invalid,
            AccessError::Validation(_) => IssueType::Required,
            AccessError::DuplicateIdentifier => IssueType::Duplicate,
            AccessError::StoreUnavailable(_) => IssueType::Transient,
            AccessError::InternalInconsistency(_) => IssueType::Exception,
        }
    }

    /// OperationOutcome body for client-facing errors.
    ///
    /// Infrastructure details are not echoed back.
    pub fn to_operation_outcome(&self) -> OperationOutcome {
        let diagnostics = if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        };
        OperationOutcome::error(self.issue_type(), &diagnostics)
    }
}

impl From<InvalidId> for AccessError {
    fn from(_: InvalidId) -> Self {
        AccessError::InvalidId
    }
}
