pub mod application;
pub mod instance;
pub mod manifest;
pub mod resource;
pub mod service;

pub use resource::{apply_update, Attributes, UpdateAction, UpdateRequest, DELETE_MARKER};

use serde::{Deserialize, Serialize};

/// Error body returned by SAPI and VMAPI (restify convention).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    pub code: String,
    pub message: String,
}

impl Error {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn missing_parameter(param: &str) -> Self {
        Self::new("MissingParameter", format!("missing {param}"))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("ResourceNotFound", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("InternalError", message)
    }

    /// Name a restify client gives this error, e.g. `MissingParameterError`.
    pub fn name(&self) -> String {
        if self.code.ends_with("Error") {
            self.code.clone()
        } else {
            format!("{}Error", self.code)
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}'", self.name(), self.message)
    }
}

impl std::error::Error for Error {}
