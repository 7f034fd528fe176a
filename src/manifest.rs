use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A configuration manifest: a template rendered to `path` inside a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub uuid: Uuid,
    pub name: String,
    pub path: String,
    pub template: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManifest {
    pub name: String,
    pub path: String,
    pub template: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}
