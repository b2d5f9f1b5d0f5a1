use serde::{Deserialize, Serialize};

/// Severity of the issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Type of issue (subset of the FHIR issue-type value set we emit)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    Duplicate,
    NotFound,
    Transient,
    Exception,
}

/// A single issue within an OperationOutcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// FHIR OperationOutcome resource, used as the body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    fn single(severity: IssueSeverity, code: IssueType, diagnostics: &str) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.to_string()),
            }],
        }
    }

    /// An error-severity outcome with the given issue type
    pub fn error(code: IssueType, diagnostics: &str) -> Self {
        Self::single(IssueSeverity::Error, code, diagnostics)
    }

    pub fn not_found(diagnostics: &str) -> Self {
        Self::error(IssueType::NotFound, diagnostics)
    }

    pub fn invalid(diagnostics: &str) -> Self {
        Self::error(IssueType::Invalid, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_fhir_shape() {
        let json = serde_json::to_value(OperationOutcome::not_found("Patient/abc not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resourceType": "OperationOutcome",
                "issue": [{
                    "severity": "error",
                    "code": "not-found",
                    "diagnostics": "Patient/abc not found"
                }]
            })
        );
    }
}
