use serde::{Deserialize, Serialize};

use crate::kind::ResourceKind;

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    pub status: String,
    pub date: String,
    pub kind: String,
    pub fhir_version: String,
    pub software: CapabilitySoftware,
    pub format: Vec<String>,
    pub rest: Vec<CapabilityRest>,
}

impl CapabilityStatement {
    /// Capability statement for this server, advertising `version` as the software version
    pub fn new(version: &str) -> Self {
        Self {
            resource_type: "CapabilityStatement".to_string(),
            status: "active".to_string(),
            date: "2026-10-19".to_string(),
            kind: "instance".to_string(),
            fhir_version: "4.0.1".to_string(),
            software: CapabilitySoftware {
                name: "medibridge".to_string(),
                version: version.to_string(),
            },
            format: vec!["json".to_string()],
            rest: vec![CapabilityRest::default()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySoftware {
    pub name: String,
    pub version: String,
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    pub resource: Vec<CapabilityResource>,
}

impl Default for CapabilityRest {
    fn default() -> Self {
        Self {
            mode: "server".to_string(),
            resource: ResourceKind::ALL
                .into_iter()
                .map(CapabilityResource::for_kind)
                .collect(),
        }
    }
}

/// Per-resource capability: what can be done with one resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub interaction: Vec<CapabilityInteraction>,
    pub search_param: Vec<CapabilitySearchParam>,
}

impl CapabilityResource {
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self {
            resource_type: kind.resource_type().to_string(),
            interaction: ["read", "create"]
                .into_iter()
                .map(|code| CapabilityInteraction {
                    code: code.to_string(),
                })
                .collect(),
            search_param: vec![CapabilitySearchParam {
                name: "identifier".to_string(),
                param_type: "token".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityInteraction {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySearchParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}
