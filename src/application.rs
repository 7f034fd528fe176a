use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Attributes;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub uuid: Uuid,
    pub name: String,
    pub owner_uuid: Uuid,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub name: String,
    pub owner_uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(flatten)]
    pub attributes: Attributes,
}
