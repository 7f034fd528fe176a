use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sapi::{
    application::{Application, CreateApplication},
    UpdateRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::{fail, no_content, not_found, ok, Reply, Stub};

pub async fn list_applications(State(stub): State<Stub>) -> Reply {
    let store = stub.store().lock().await;
    let apps: Vec<&Application> = store.applications.values().collect();

    ok(&apps)
}

pub async fn post_application(
    State(stub): State<Stub>,
    Json(req): Json<CreateApplication>,
) -> Reply {
    let mut store = stub.store().lock().await;
    let uuid = req.uuid.unwrap_or_else(Uuid::new_v4);

    if store.applications.contains_key(&uuid) {
        return fail(
            StatusCode::CONFLICT,
            sapi::Error::new("Conflict", format!("application {uuid} already exists")),
        );
    }

    let app = Application {
        uuid,
        name: req.name,
        owner_uuid: req.owner_uuid,
        attributes: req.attributes,
    };

    info!(%uuid, name = %app.name, "application created");

    store.applications.insert(uuid, app.clone());
    ok(&app)
}

pub async fn get_application(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.applications.get(&uuid) {
        Some(app) => ok(app),
        None => not_found("application", uuid),
    }
}

pub async fn put_application(
    State(stub): State<Stub>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Reply {
    let mut store = stub.store().lock().await;

    let Some(app) = store.applications.get_mut(&uuid) else {
        return not_found("application", uuid);
    };

    stub.apply(&mut app.attributes, &req);
    ok(app)
}

pub async fn delete_application(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let mut store = stub.store().lock().await;

    match store.applications.remove(&uuid) {
        Some(_) => no_content(),
        None => not_found("application", uuid),
    }
}
