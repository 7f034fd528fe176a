use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Failure talking to SAPI or VMAPI.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {error}")]
    Api {
        status: StatusCode,
        error: sapi::Error,
    },

    #[error("could not decode {status} response: {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("vm job {job_uuid} finished with execution {execution:?}")]
    Job { job_uuid: Uuid, execution: String },

    #[error("vm job {job_uuid} still running after {attempts} checks")]
    JobTimeout { job_uuid: Uuid, attempts: u32 },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } | ClientError::Decode { status, .. } => Some(*status),
            ClientError::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// Observed state differed from the expected state.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionFailure {
    pub step: String,
    pub what: String,
    pub expected: Value,
    pub actual: Value,
}

fn pretty(v: &Value) -> String {
    match serde_json::to_string_pretty(v) {
        Ok(text) => text,
        Err(_) => v.to_string(),
    }
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}: {}", self.step, self.what)?;
        writeln!(f, "  expected: {}", pretty(&self.expected))?;
        write!(f, "    actual: {}", pretty(&self.actual))
    }
}

impl std::error::Error for AssertionFailure {}

/// Why a scenario did not pass.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("setup step {step:?} failed: {source}")]
    Setup {
        step: String,
        #[source]
        source: ClientError,
    },

    #[error("step {step:?} could not reach the service: {source}")]
    Request {
        step: String,
        #[source]
        source: ClientError,
    },

    #[error("assertion failed in {0}")]
    Assertion(#[from] AssertionFailure),
}

impl HarnessError {
    pub fn setup(step: impl Into<String>) -> impl FnOnce(ClientError) -> HarnessError {
        let step = step.into();
        move |source| HarnessError::Setup { step, source }
    }

    pub fn request(step: impl Into<String>) -> impl FnOnce(ClientError) -> HarnessError {
        let step = step.into();
        move |source| HarnessError::Request { step, source }
    }

    pub fn as_assertion(&self) -> Option<&AssertionFailure> {
        match self {
            HarnessError::Assertion(failure) => Some(failure),
            _ => None,
        }
    }
}
