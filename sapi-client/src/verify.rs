use reqwest::StatusCode;
use sapi::{Attributes, UpdateAction, UpdateRequest, DELETE_MARKER};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    assert::{expect_body, expect_eq, expect_status},
    client::SapiClient,
    error::HarnessError,
};

/// One partial update and the keys it carries for each map.
#[derive(Debug, Clone, Copy)]
pub struct UpdateStep {
    pub action: UpdateAction,
    pub params: &'static [(&'static str, &'static str)],
    pub metadata: &'static [(&'static str, &'static str)],
}

impl UpdateStep {
    pub fn request(&self) -> UpdateRequest {
        let (params, metadata) = (self.params, self.metadata);

        match self.action {
            UpdateAction::Delete => UpdateRequest::delete(&keys(params), &keys(metadata)),
            UpdateAction::Update => UpdateRequest::update(pairs(params), pairs(metadata)),
            UpdateAction::Replace => UpdateRequest::replace(pairs(params), pairs(metadata)),
        }
    }
}

fn keys(pairs: &[(&'static str, &'static str)]) -> Vec<&'static str> {
    pairs.iter().map(|(key, _)| *key).collect()
}

fn pairs(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(*value)))
        .collect()
}

/// Add a field, delete it, add others, then replace everything.
pub const UPDATE_STEPS: [UpdateStep; 4] = [
    UpdateStep {
        action: UpdateAction::Update,
        params: &[("foo", "baz")],
        metadata: &[("foo", "bar")],
    },
    UpdateStep {
        action: UpdateAction::Delete,
        params: &[("foo", DELETE_MARKER)],
        metadata: &[("foo", DELETE_MARKER)],
    },
    UpdateStep {
        action: UpdateAction::Update,
        params: &[("oldparam", "oldvalue")],
        metadata: &[("oldmd", "oldvalue")],
    },
    UpdateStep {
        action: UpdateAction::Replace,
        params: &[("newparam", "newvalue")],
        metadata: &[("newmd", "newvalue")],
    },
];

/// Drive [`UPDATE_STEPS`] against the resource at `uri`.
///
/// The expected maps start from the resource as currently stored and are
/// advanced with [`Attributes::apply`] before each request, so every reply
/// must match them exactly: nothing dropped, nothing left behind.
pub async fn verify_updates(sapi: &SapiClient, uri: &str) -> Result<(), HarnessError> {
    let reply = sapi
        .raw()
        .get(uri)
        .await
        .map_err(HarnessError::request("read before updates"))?;
    expect_status("read before updates", &reply, StatusCode::OK)?;

    let mut expected: Attributes = expect_body("read before updates", &reply)?;

    for (idx, step) in UPDATE_STEPS.iter().enumerate() {
        let name = format!("update step {} ({})", idx + 1, step.action);
        let req = step.request();

        expected.apply(&req);

        let reply = sapi
            .update(uri, &req)
            .await
            .map_err(HarnessError::request(name.as_str()))?;
        expect_status(&name, &reply, StatusCode::OK)?;

        let actual: Attributes = expect_body(&name, &reply)?;
        expect_eq(&name, "params", &expected.params, &actual.params)?;
        expect_eq(&name, "metadata", &expected.metadata, &actual.metadata)?;

        info!(uri, step = %name, "update verified");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(action: &str, param: (&str, &str), md: (&str, &str)) -> Value {
        let mut body = json!({ "action": action, "params": {}, "metadata": {} });
        body["params"][param.0] = json!(param.1);
        body["metadata"][md.0] = json!(md.1);
        body
    }

    #[test]
    fn steps_build_the_expected_wire_bodies() {
        let bodies: Vec<Value> = UPDATE_STEPS
            .iter()
            .map(|step| serde_json::to_value(step.request()).unwrap())
            .collect();

        assert_eq!(
            bodies,
            vec![
                body("update", ("foo", "baz"), ("foo", "bar")),
                body("delete", ("foo", " "), ("foo", " ")),
                body("update", ("oldparam", "oldvalue"), ("oldmd", "oldvalue")),
                body("replace", ("newparam", "newvalue"), ("newmd", "newvalue")),
            ]
        );
    }

    #[test]
    fn steps_end_with_only_the_replacement_keys() {
        let mut attrs = Attributes::default();
        let alias = json!("sapitest-0000beef");
        attrs.params.insert("alias".to_string(), alias);

        for step in &UPDATE_STEPS {
            attrs.apply(&step.request());
        }

        let params = Value::Object(attrs.params);
        let metadata = Value::Object(attrs.metadata);
        assert_eq!(params, json!({ "newparam": "newvalue" }));
        assert_eq!(metadata, json!({ "newmd": "newvalue" }));
    }
}
