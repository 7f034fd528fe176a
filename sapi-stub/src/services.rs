use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sapi::{
    service::{CreateService, Service},
    UpdateRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::{fail, no_content, not_found, ok, Reply, Stub};

pub async fn list_services(State(stub): State<Stub>) -> Reply {
    let store = stub.store().lock().await;
    let svcs: Vec<&Service> = store.services.values().collect();

    ok(&svcs)
}

pub async fn post_service(State(stub): State<Stub>, Json(req): Json<CreateService>) -> Reply {
    let mut store = stub.store().lock().await;
    let uuid = req.uuid.unwrap_or_else(Uuid::new_v4);

    let app_uuid = req.application_uuid;
    if !store.applications.contains_key(&app_uuid) {
        let error = sapi::Error::internal(format!("application {app_uuid} does not exist"));
        return fail(StatusCode::INTERNAL_SERVER_ERROR, error);
    }

    if store.services.contains_key(&uuid) {
        return fail(
            StatusCode::CONFLICT,
            sapi::Error::new("Conflict", format!("service {uuid} already exists")),
        );
    }

    let svc = Service {
        uuid,
        name: req.name,
        application_uuid: req.application_uuid,
        attributes: req.attributes,
    };

    info!(%uuid, application = %svc.application_uuid, "service created");

    store.services.insert(uuid, svc.clone());
    ok(&svc)
}

pub async fn get_service(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.services.get(&uuid) {
        Some(svc) => ok(svc),
        None => not_found("service", uuid),
    }
}

pub async fn put_service(
    State(stub): State<Stub>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Reply {
    let mut store = stub.store().lock().await;

    let Some(svc) = store.services.get_mut(&uuid) else {
        return not_found("service", uuid);
    };

    stub.apply(&mut svc.attributes, &req);
    ok(svc)
}

pub async fn delete_service(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let mut store = stub.store().lock().await;

    match store.services.remove(&uuid) {
        Some(_) => no_content(),
        None => not_found("service", uuid),
    }
}
