use axum::extract::{Path, State};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{not_found, ok, Job, Reply, Stub};

pub async fn get_vm(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.vms.get(&uuid) {
        Some(vm) => ok(&json!({ "uuid": vm.uuid, "state": vm.state })),
        None => not_found("vm", uuid),
    }
}

/// Destroys the VM only; any SAPI instance record is left alone.
pub async fn delete_vm(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let mut store = stub.store().lock().await;

    if store.vms.remove(&uuid).is_none() {
        return not_found("vm", uuid);
    }

    let job = Job {
        uuid: Uuid::new_v4(),
        vm_uuid: uuid,
        execution: stub.job_outcome.execution().to_string(),
    };

    info!(vm = %uuid, job = %job.uuid, execution = %job.execution, "vm destroyed");

    let reply = ok(&json!({ "vm_uuid": uuid, "job_uuid": job.uuid }));
    store.jobs.insert(job.uuid, job);
    reply
}

pub async fn get_job(State(stub): State<Stub>, Path(uuid): Path<Uuid>) -> Reply {
    let store = stub.store().lock().await;

    match store.jobs.get(&uuid) {
        Some(job) => ok(&json!({
            "uuid": job.uuid,
            "vm_uuid": job.vm_uuid,
            "execution": job.execution,
        })),
        None => not_found("job", uuid),
    }
}
