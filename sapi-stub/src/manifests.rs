use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sapi::manifest::{CreateManifest, Manifest};
use uuid::Uuid;

use crate::{fail, no_content, not_found, ok, Reply, Stub};

pub async fn list_manifests(State(stub): State<Stub>) -> Reply {
    let store = stub.store().lock().await;
    let manifests: Vec<&Manifest> = store.manifests.values().collect();

    ok(&manifests)
}

pub async fn post_manifest(State(stub): State<Stub>, Json(req): Json<CreateManifest>) -> Reply {
    let mut store = stub.store().lock().await;
    let uuid = req.uuid.unwrap_or_else(Uuid::new_v4);

    if store.manifests.contains_key(&uuid) {
        return fail(
            StatusCode::CONFLICT,
            sapi::Error::new("Conflict", format!("manifest {uuid} already exists")),
        );
    }

    let manifest = Manifest {
        uuid,
        name: req.name,
        path: req.path,
        template: req.template,
    };

    store.manifests.insert(uuid, manifest.clone());
    ok(&manifest)
}

pub async fn get_manifest(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.manifests.get(&uuid) {
        Some(manifest) => ok(manifest),
        None => not_found("manifest", uuid),
    }
}

pub async fn delete_manifest(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let mut store = stub.store().lock().await;

    match store.manifests.remove(&uuid) {
        Some(_) => no_content(),
        None => not_found("manifest", uuid),
    }
}
