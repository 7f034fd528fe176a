use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::Attributes;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub uuid: Uuid,
    pub service_uuid: Uuid,
    #[serde(flatten)]
    pub attributes: Attributes,
    /// Manifest name to manifest uuid.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub manifests: BTreeMap<String, Uuid>,
}

/// Body of `POST /instances`.
///
/// `service_uuid` is optional here only so that callers can exercise the
/// service's rejection of a request that omits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub manifests: BTreeMap<String, Uuid>,
    /// Block until the backing VM is provisioned.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wait: bool,
}

impl CreateInstance {
    pub fn new(service_uuid: Uuid) -> Self {
        Self {
            service_uuid: Some(service_uuid),
            ..Default::default()
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.params.get("alias").and_then(Value::as_str)
    }
}

/// Provisioning payload SAPI hands to VMAPI for an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePayload {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub customer_metadata: Map<String, Value>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}
