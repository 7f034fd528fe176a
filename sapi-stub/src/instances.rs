use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sapi::{
    instance::{CreateInstance, Instance, InstancePayload},
    Attributes, UpdateRequest,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::{fail, no_content, not_found, ok, Reply, Store, Stub, Vm};

#[derive(Debug, Default, Deserialize)]
pub struct InstanceFilter {
    pub service_uuid: Option<Uuid>,
}

impl InstanceFilter {
    pub fn matches(&self, inst: &Instance) -> bool {
        match self.service_uuid {
            Some(service_uuid) => inst.service_uuid == service_uuid,
            None => true,
        }
    }
}

pub async fn list_instances(
    State(stub): State<Stub>,
    Query(filter): Query<InstanceFilter>,
) -> Reply {
    let store = stub.store().lock().await;

    let insts: Vec<&Instance> = store
        .instances
        .iter()
        .filter(|inst| filter.matches(inst))
        .collect();

    ok(&insts)
}

pub async fn post_instance(State(stub): State<Stub>, Json(req): Json<CreateInstance>) -> Reply {
    let mut store = stub.store().lock().await;

    let Some(service_uuid) = req.service_uuid else {
        let error = sapi::Error::missing_parameter("service_uuid");
        return fail(StatusCode::CONFLICT, error);
    };

    if !store.services.contains_key(&service_uuid) {
        let error = sapi::Error::internal(format!("service {service_uuid} does not exist"));
        return fail(StatusCode::INTERNAL_SERVER_ERROR, error);
    }

    let missing = req
        .manifests
        .iter()
        .find(|(_, uuid)| !store.manifests.contains_key(*uuid));
    if let Some((name, uuid)) = missing {
        let error = sapi::Error::internal(format!("manifest {name} ({uuid}) does not exist"));
        return fail(StatusCode::INTERNAL_SERVER_ERROR, error);
    }

    let uuid = req.uuid.unwrap_or_else(Uuid::new_v4);
    if store.instance(uuid).is_some() {
        return fail(
            StatusCode::CONFLICT,
            sapi::Error::new("Conflict", format!("instance {uuid} already exists")),
        );
    }

    let inst = Instance {
        uuid,
        service_uuid,
        attributes: Attributes {
            params: req.params,
            metadata: req.metadata,
        },
        manifests: req.manifests,
    };

    // Provisioning is immediate here, so `wait` has nothing to wait for.
    store.vms.insert(
        uuid,
        Vm {
            uuid,
            state: "running".to_string(),
        },
    );
    store.instances.push(inst.clone());

    info!(%uuid, service = %service_uuid, "instance created");

    ok(&inst)
}

pub async fn get_instance(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.instance(uuid) {
        Some(inst) => ok(inst),
        None => not_found("instance", uuid),
    }
}

pub async fn get_payload(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match payload(&store, uuid) {
        Some(payload) => ok(&payload),
        None => not_found("instance", uuid),
    }
}

/// Application, service and instance params layered in that order, with the
/// same layering for metadata.
pub fn payload(store: &Store, uuid: Uuid) -> Option<InstancePayload> {
    let inst = store.instance(uuid)?;
    let svc = store.services.get(&inst.service_uuid);
    let app = svc.and_then(|svc| store.applications.get(&svc.application_uuid));

    let layers = [
        app.map(|app| &app.attributes),
        svc.map(|svc| &svc.attributes),
        Some(&inst.attributes),
    ];

    let mut params = Map::new();
    let mut customer_metadata = Map::new();
    for attrs in layers.into_iter().flatten() {
        params.extend(attrs.params.clone());
        customer_metadata.extend(attrs.metadata.clone());
    }

    let alias = match params.remove("alias") {
        Some(Value::String(alias)) => Some(alias),
        _ => None,
    };
    params.remove("uuid");
    params.remove("customer_metadata");

    Some(InstancePayload {
        uuid,
        alias,
        customer_metadata,
        params,
    })
}

pub async fn put_instance(
    State(stub): State<Stub>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Reply {
    let mut store = stub.store().lock().await;

    let Some(inst) = store.instance_mut(uuid) else {
        return not_found("instance", uuid);
    };

    stub.apply(&mut inst.attributes, &req);
    ok(inst)
}

/// Removes the record whether or not its VM still exists.
pub async fn delete_instance(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let mut store = stub.store().lock().await;

    let Some(idx) = store.instances.iter().position(|inst| inst.uuid == uuid) else {
        return not_found("instance", uuid);
    };

    store.instances.remove(idx);
    if store.vms.remove(&uuid).is_none() {
        info!(%uuid, "instance had no vm");
    }

    no_content()
}
