use std::fmt;

use serde::{Deserialize, Serialize};

/// The resource types served by this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Patient,
    MedicationRequest,
}

impl ResourceKind {
    /// Every supported kind, in a stable order
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Patient, ResourceKind::MedicationRequest];

    /// The `resourceType` tag stamped on stored documents
    pub fn resource_type(self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::MedicationRequest => "MedicationRequest",
        }
    }

    /// Name of the collection (table) holding documents of this kind
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Patient => "patient",
            ResourceKind::MedicationRequest => "medication_request",
        }
    }

    /// HTTP path segment the shell mounts this kind under
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Patient => "patient",
            ResourceKind::MedicationRequest => "medicationRequest",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct_per_kind() {
        let [a, b] = ResourceKind::ALL;
        assert_ne!(a.collection(), b.collection());
        assert_ne!(a.path(), b.path());
        assert_eq!(b.to_string(), "MedicationRequest");
    }
}
