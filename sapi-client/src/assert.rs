//! Checks that turn an observed reply into an [`AssertionFailure`].

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{client::Reply, error::AssertionFailure};

pub fn expect_eq<T: Serialize + PartialEq>(
    step: &str,
    what: &str,
    expected: &T,
    actual: &T,
) -> Result<(), AssertionFailure> {
    if expected == actual {
        return Ok(());
    }

    Err(AssertionFailure {
        step: step.to_string(),
        what: what.to_string(),
        expected: serde_json::to_value(expected).unwrap_or(Value::Null),
        actual: serde_json::to_value(actual).unwrap_or(Value::Null),
    })
}

pub fn expect_true(step: &str, what: &str, cond: bool) -> Result<(), AssertionFailure> {
    expect_eq(step, what, &true, &cond)
}

pub fn expect_status(
    step: &str,
    reply: &Reply,
    expected: StatusCode,
) -> Result<(), AssertionFailure> {
    if reply.status == expected {
        return Ok(());
    }

    Err(AssertionFailure {
        step: step.to_string(),
        what: "status code".to_string(),
        expected: json!(expected.as_u16()),
        actual: json!({
            "status": reply.status.as_u16(),
            "body": reply.body.clone().unwrap_or(Value::Null),
        }),
    })
}

/// The reply must have failed with `status`, and with `name` when given.
pub fn expect_rejection(
    step: &str,
    reply: &Reply,
    status: StatusCode,
    name: Option<&str>,
) -> Result<sapi::Error, AssertionFailure> {
    expect_status(step, reply, status)?;

    let error = reply.error().ok_or_else(|| AssertionFailure {
        step: step.to_string(),
        what: "error body".to_string(),
        expected: json!("an error"),
        actual: reply.body.clone().unwrap_or(Value::Null),
    })?;

    if let Some(name) = name {
        expect_eq(step, "error name", &name.to_string(), &error.name())?;
    }

    Ok(error)
}

/// Decode a successful reply body, or fail the step.
pub fn expect_body<T: serde::de::DeserializeOwned>(
    step: &str,
    reply: &Reply,
) -> Result<T, AssertionFailure> {
    let body = reply.body.clone().unwrap_or(Value::Null);

    serde_json::from_value(body.clone()).map_err(|err| AssertionFailure {
        step: step.to_string(),
        what: format!("decodable body ({err})"),
        expected: json!(std::any::type_name::<T>()),
        actual: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_reports_both_sides() {
        let failure = expect_eq("step", "params.foo", &json!("baz"), &json!("bar")).unwrap_err();

        assert_eq!(failure.expected, json!("baz"));
        assert_eq!(failure.actual, json!("bar"));
        assert!(failure.to_string().contains("params.foo"));
    }

    #[test]
    fn rejection_checks_status_and_name() {
        let body = json!({ "code": "MissingParameter", "message": "missing service_uuid" });
        let reply = Reply {
            status: StatusCode::CONFLICT,
            body: Some(body),
        };
        let conflict = StatusCode::CONFLICT;

        let error = expect_rejection("create", &reply, conflict, Some("MissingParameterError"));
        assert_eq!(error.unwrap().code, "MissingParameter");

        let other = StatusCode::INTERNAL_SERVER_ERROR;
        assert!(expect_rejection("create", &reply, other, None).is_err());
        let misnamed = expect_rejection("create", &reply, conflict, Some("NotFoundError"));
        assert!(misnamed.is_err());
    }

    #[test]
    fn success_is_not_a_rejection() {
        let reply = Reply {
            status: StatusCode::OK,
            body: Some(json!({})),
        };

        let failure = expect_rejection("create", &reply, StatusCode::CONFLICT, None).unwrap_err();
        assert_eq!(failure.what, "status code");
    }

    #[test]
    fn plain_text_error_keeps_its_reason_and_text() {
        let reply = Reply {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Some(Value::String("Internal Server Error".to_string())),
        };
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let error = expect_rejection("create", &reply, status, None).unwrap();
        assert_eq!(error.code, "InternalServerError");
        assert_eq!(error.message, "Internal Server Error");
    }
}
