//! In-memory stand-in for SAPI and VMAPI.
//!
//! Answers just the endpoints the contract harness calls, with the same
//! status codes and partial-update semantics, so the harness can be exercised
//! without a deployment. Nothing is persisted.

pub mod applications;
pub mod instances;
pub mod manifests;
pub mod services;
pub mod vms;

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use sapi::{
    application::Application, apply_update, instance::Instance, manifest::Manifest,
    service::Service, Attributes, UpdateAction, UpdateRequest,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info};
use uuid::Uuid;

pub type Reply = Response;

/// How faithfully the stub honours the partial-update contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Conforming,
    /// Merge on `replace` instead of overwriting.
    ReplaceAsUpdate,
    /// Overwrite on `update` instead of merging.
    UpdateAsReplace,
    /// Accept `delete` without removing anything.
    IgnoreDelete,
}

/// How VM destruction jobs end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobOutcome {
    #[default]
    Succeeded,
    Failed,
    /// Never leaves `running`.
    Stuck,
}

impl JobOutcome {
    pub fn execution(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Failed => "failed",
            JobOutcome::Stuck => "running",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vm {
    pub uuid: Uuid,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub uuid: Uuid,
    pub vm_uuid: Uuid,
    pub execution: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub applications: HashMap<Uuid, Application>,
    pub services: HashMap<Uuid, Service>,
    pub manifests: HashMap<Uuid, Manifest>,
    /// Kept in creation order for listings.
    pub instances: Vec<Instance>,
    pub vms: HashMap<Uuid, Vm>,
    pub jobs: HashMap<Uuid, Job>,
}

impl Store {
    pub fn instance(&self, uuid: Uuid) -> Option<&Instance> {
        self.instances.iter().find(|inst| inst.uuid == uuid)
    }

    pub fn instance_mut(&mut self, uuid: Uuid) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|inst| inst.uuid == uuid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stub {
    store: Arc<Mutex<Store>>,
    behavior: Behavior,
    job_outcome: JobOutcome,
}

impl Stub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn with_job_outcome(mut self, job_outcome: JobOutcome) -> Self {
        self.job_outcome = job_outcome;
        self
    }

    pub fn store(&self) -> &Mutex<Store> {
        &self.store
    }

    pub fn apply(&self, attributes: &mut Attributes, req: &UpdateRequest) {
        let action = match (self.behavior, req.action) {
            (Behavior::IgnoreDelete, UpdateAction::Delete) => return,
            (Behavior::ReplaceAsUpdate, UpdateAction::Replace) => UpdateAction::Update,
            (Behavior::UpdateAsReplace, UpdateAction::Update) => UpdateAction::Replace,
            (_, action) => action,
        };

        apply_update(&mut attributes.params, action, &req.params);
        apply_update(&mut attributes.metadata, action, &req.metadata);
    }
}

pub fn ok<T: serde::Serialize>(value: &T) -> Reply {
    match serde_json::to_value(value) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            let error = sapi::Error::internal(err.to_string());
            fail(StatusCode::INTERNAL_SERVER_ERROR, error)
        }
    }
}

pub fn no_content() -> Reply {
    StatusCode::NO_CONTENT.into_response()
}

pub fn fail(status: StatusCode, error: sapi::Error) -> Reply {
    let body = serde_json::to_value(error).unwrap_or_default();
    (status, Json(body)).into_response()
}

pub fn not_found(kind: &str, uuid: Uuid) -> Reply {
    let error = sapi::Error::not_found(format!("{kind} {uuid} not found"));
    fail(StatusCode::NOT_FOUND, error)
}

pub fn router(stub: Stub) -> Router {
    Router::new()
        .route(
            "/applications",
            get(applications::list_applications).post(applications::post_application),
        )
        .route(
            "/applications/:uuid",
            get(applications::get_application)
                .put(applications::put_application)
                .delete(applications::delete_application),
        )
        .route(
            "/services",
            get(services::list_services).post(services::post_service),
        )
        .route(
            "/services/:uuid",
            get(services::get_service)
                .put(services::put_service)
                .delete(services::delete_service),
        )
        .route(
            "/manifests",
            get(manifests::list_manifests).post(manifests::post_manifest),
        )
        .route(
            "/manifests/:uuid",
            get(manifests::get_manifest).delete(manifests::delete_manifest),
        )
        .route(
            "/instances",
            get(instances::list_instances).post(instances::post_instance),
        )
        .route(
            "/instances/:uuid",
            get(instances::get_instance)
                .put(instances::put_instance)
                .delete(instances::delete_instance),
        )
        .route("/instances/:uuid/payload", get(instances::get_payload))
        .route("/vms/:uuid", delete(vms::delete_vm).get(vms::get_vm))
        .route("/jobs/:uuid", get(vms::get_job))
        .with_state(stub)
}

/// Serve `stub` on `addr` in the background and return the bound address.
pub async fn spawn(
    stub: Stub,
    addr: SocketAddr,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let service = router(stub).into_make_service();
    let server = axum::Server::try_bind(&addr)?.serve(service);
    let local_addr = server.local_addr();

    info!(%local_addr, "stub listening");

    let handle = tokio::spawn(async move {
        if let Err(err) = server.await {
            error!(%err, "stub server stopped");
        }
    });

    Ok((local_addr, handle))
}
