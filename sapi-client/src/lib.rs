//! Contract tests for the Services API (SAPI).
//!
//! [`fixture`] builds the application/service/manifest/instance hierarchy a
//! scenario needs, [`verify`] drives the partial-update contract against one
//! resource, and [`scenario`] strings both together into the runs the
//! `sapi-harness` binary reports on.

pub mod assert;
pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod scenario;
pub mod verify;
pub mod vmapi;

pub use client::{JsonClient, Reply, SapiClient};
pub use config::Config;
pub use error::{AssertionFailure, ClientError, HarnessError};
pub use scenario::{Harness, Scenario, ScenarioReport};
pub use vmapi::VmapiClient;
