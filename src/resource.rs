use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value SAPI clients send for a key that a `delete` update should remove.
///
/// Only the key matters to the service. [`UpdateRequest::delete`] fills it in.
pub const DELETE_MARKER: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    /// Right-biased union with the existing map.
    Update,
    /// Remove every key named in the payload.
    Delete,
    /// Overwrite the map wholesale.
    Replace,
}

impl std::fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UpdateAction::Update => "update",
            UpdateAction::Delete => "delete",
            UpdateAction::Replace => "replace",
        })
    }
}

/// The two independent attribute maps every SAPI resource carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Attributes {
    pub fn apply(&mut self, req: &UpdateRequest) {
        apply_update(&mut self.params, req.action, &req.params);
        apply_update(&mut self.metadata, req.action, &req.metadata);
    }
}

/// Body of `PUT /<kind>/:uuid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub action: UpdateAction,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl UpdateRequest {
    pub fn update(params: Map<String, Value>, metadata: Map<String, Value>) -> Self {
        Self {
            action: UpdateAction::Update,
            params,
            metadata,
        }
    }

    pub fn replace(params: Map<String, Value>, metadata: Map<String, Value>) -> Self {
        Self {
            action: UpdateAction::Replace,
            params,
            metadata,
        }
    }

    pub fn delete(param_keys: &[&str], metadata_keys: &[&str]) -> Self {
        Self {
            action: UpdateAction::Delete,
            params: marked(param_keys),
            metadata: marked(metadata_keys),
        }
    }
}

fn marked(keys: &[&str]) -> Map<String, Value> {
    let mut map = Map::new();
    for key in keys {
        map.insert(key.to_string(), Value::String(DELETE_MARKER.to_string()));
    }
    map
}

/// Apply one partial update to a single attribute map.
pub fn apply_update(
    target: &mut Map<String, Value>,
    action: UpdateAction,
    changes: &Map<String, Value>,
) {
    match action {
        UpdateAction::Update => {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        UpdateAction::Delete => {
            for key in changes.keys() {
                target.remove(key);
            }
        }
        UpdateAction::Replace => {
            *target = changes.clone();
        }
    }
}
