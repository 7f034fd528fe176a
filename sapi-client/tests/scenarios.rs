use reqwest::StatusCode;
use sapi::instance::CreateInstance;
use sapi_client::{
    client::{instance_uri, JsonClient},
    fixture::{ScenarioContext, IMAGE_UUID, MANIFEST_NAME},
    scenario::sample_metadata,
    verify::verify_updates,
    AssertionFailure, ClientError, Config, Harness, HarnessError, Scenario, VmapiClient,
};
use sapi_stub::{Behavior, JobOutcome, Stub};
use serde_json::json;
use uuid::Uuid;

async fn start(stub: Stub) -> (Harness, Config) {
    let addr = "127.0.0.1:0".parse().unwrap();
    let (addr, _server) = sapi_stub::spawn(stub, addr).await.unwrap();

    let url = format!("http://{addr}");
    let mut config = Config::new(&url, &url, Uuid::new_v4());
    config.job_poll_ms = 10;
    config.job_poll_attempts = 5;

    (Harness::new(&config).unwrap(), config)
}

async fn assertion_failure(behavior: Behavior) -> AssertionFailure {
    let (harness, _) = start(Stub::with_behavior(behavior)).await;

    let report = harness.run(Scenario::PutGetDel).await;
    match report.result {
        Err(HarnessError::Assertion(failure)) => failure,
        other => panic!("expected an assertion failure, got {other:?}"),
    }
}

/// Application, service and one instance with its VM, all under `ctx`.
async fn create_instance(harness: &Harness, ctx: &ScenarioContext) {
    let fixtures = harness.fixtures();

    let app_uuid = Some(ctx.app_uuid);
    fixtures.create_application(app_uuid).await.unwrap();
    fixtures
        .create_service(ctx.app_uuid, Some(ctx.svc_uuid))
        .await
        .unwrap();

    let req = CreateInstance {
        uuid: Some(ctx.instance_uuid),
        ..CreateInstance::new(ctx.svc_uuid)
    };
    fixtures.create_instance(req).await.unwrap();
}

#[tokio::test]
async fn all_scenarios_pass_against_a_conforming_service() {
    let (harness, _) = start(Stub::new()).await;

    let reports = harness.run_all(&Scenario::ALL).await;

    assert_eq!(reports.len(), 3);
    for report in &reports {
        let name = report.scenario.name();
        assert!(report.passed(), "{name}: {:?}", report.result);
    }
}

#[tokio::test]
async fn replace_that_merges_is_an_assertion_failure() {
    let failure = assertion_failure(Behavior::ReplaceAsUpdate).await;

    assert_eq!(failure.step, "update step 4 (replace)");
    assert_eq!(failure.what, "params");
    assert_eq!(failure.expected, json!({ "newparam": "newvalue" }));
    assert_eq!(failure.actual["newparam"], json!("newvalue"));
    assert_eq!(failure.actual["oldparam"], json!("oldvalue"));
}

#[tokio::test]
async fn delete_that_keeps_keys_is_an_assertion_failure() {
    let failure = assertion_failure(Behavior::IgnoreDelete).await;

    assert_eq!(failure.step, "update step 2 (delete)");
    assert_eq!(failure.what, "params");
    assert_eq!(failure.expected, json!({}));
    assert_eq!(failure.actual, json!({ "foo": "baz" }));
}

#[tokio::test]
async fn update_that_overwrites_is_an_assertion_failure() {
    let failure = assertion_failure(Behavior::UpdateAsReplace).await;

    // The instance starts without params, so only its metadata shows the loss.
    assert_eq!(failure.step, "update step 1 (update)");
    assert_eq!(failure.what, "metadata");
    assert_eq!(failure.expected["string_val"], json!("my string"));
    assert_eq!(failure.expected["foo"], json!("bar"));
    assert_eq!(failure.actual, json!({ "foo": "bar" }));
}

#[tokio::test]
async fn other_scenarios_do_not_depend_on_replace() {
    let stub = Stub::with_behavior(Behavior::ReplaceAsUpdate);
    let (harness, _) = start(stub).await;

    let scenarios = [Scenario::InvalidInputs, Scenario::DeleteWithoutVm];
    let reports = harness.run_all(&scenarios).await;

    let passed = reports.iter().all(|report| report.passed());
    assert!(passed, "{reports:?}");
}

#[tokio::test]
async fn updates_verify_on_applications_too() {
    let (harness, _) = start(Stub::new()).await;
    let ctx = ScenarioContext::generate();

    let fixtures = harness.fixtures();
    let app_uuid = Some(ctx.app_uuid);
    fixtures.create_application(app_uuid).await.unwrap();

    let uri = format!("/applications/{}", ctx.app_uuid);
    verify_updates(harness.sapi(), &uri).await.unwrap();

    let app = harness.sapi().get_application(ctx.app_uuid).await.unwrap();
    let params = json!(app.attributes.params);
    let metadata = json!(app.attributes.metadata);
    assert_eq!(params, json!({ "newparam": "newvalue" }));
    assert_eq!(metadata, json!({ "newmd": "newvalue" }));
}

#[tokio::test]
async fn parents_read_back_as_created() {
    let (harness, _) = start(Stub::new()).await;
    let fixtures = harness.fixtures();
    let sapi = harness.sapi();
    let ctx = ScenarioContext::generate();

    let app_uuid = Some(ctx.app_uuid);
    fixtures.create_application(app_uuid).await.unwrap();
    let svc = fixtures
        .create_service(ctx.app_uuid, Some(ctx.svc_uuid))
        .await
        .unwrap();
    let manifest = fixtures.create_manifest(None).await.unwrap();

    assert_eq!(sapi.get_service(ctx.svc_uuid).await.unwrap(), svc);
    assert_eq!(svc.application_uuid, ctx.app_uuid);
    assert_eq!(svc.attributes.params["image_uuid"], json!(IMAGE_UUID));

    assert_eq!(sapi.get_manifest(manifest.uuid).await.unwrap(), manifest);
    assert_eq!(manifest.name, MANIFEST_NAME);

    fixtures.delete_manifest(manifest.uuid).await.unwrap();
    fixtures.delete_service(ctx.svc_uuid).await.unwrap();

    let err = sapi.get_service(ctx.svc_uuid).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    let err = sapi.get_manifest(manifest.uuid).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn created_instance_reads_back_identically() {
    let (harness, _) = start(Stub::new()).await;
    let fixtures = harness.fixtures();
    let sapi = harness.sapi();
    let ctx = ScenarioContext::generate();

    let app_uuid = Some(ctx.app_uuid);
    fixtures.create_application(app_uuid).await.unwrap();
    fixtures
        .create_service(ctx.app_uuid, Some(ctx.svc_uuid))
        .await
        .unwrap();

    let req = CreateInstance {
        uuid: Some(ctx.instance_uuid),
        metadata: sample_metadata(),
        ..CreateInstance::new(ctx.svc_uuid)
    };
    let created = fixtures.create_instance(req).await.unwrap();

    let alias = created.attributes.params["alias"].as_str().unwrap();
    assert!(alias.starts_with("sapitest-"));

    let read = sapi.get_instance(ctx.instance_uuid).await.unwrap();
    assert_eq!(read, created);
    assert_eq!(
        json!(read.attributes.metadata),
        json!({
            "string_val": "my string",
            "num_val": 123,
            "bool_val": true,
            "array_val": [1, 2, 3],
            "obj_val": { "foo": "baz" },
        })
    );

    let listed = sapi.list_instances(Some(ctx.svc_uuid)).await.unwrap();
    assert_eq!(listed, vec![created.clone()]);
    let listed = sapi.list_instances(Some(Uuid::new_v4())).await.unwrap();
    assert!(listed.is_empty());

    let payload = sapi.get_instance_payload(ctx.instance_uuid).await;
    let payload = payload.unwrap();
    assert_eq!(payload.uuid, ctx.instance_uuid);
    assert_eq!(payload.alias.as_deref(), Some(alias));
    assert_eq!(payload.params["image_uuid"], json!(IMAGE_UUID));
    assert_eq!(payload.params["ram"], json!(256));
    assert_eq!(payload.customer_metadata, sample_metadata());

    fixtures.delete_instance(ctx.instance_uuid).await.unwrap();

    let err = sapi.get_instance(ctx.instance_uuid).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn caller_supplied_alias_is_kept() {
    let (harness, _) = start(Stub::new()).await;
    let fixtures = harness.fixtures();
    let ctx = ScenarioContext::generate();

    let app_uuid = Some(ctx.app_uuid);
    fixtures.create_application(app_uuid).await.unwrap();
    fixtures
        .create_service(ctx.app_uuid, Some(ctx.svc_uuid))
        .await
        .unwrap();

    let mut req = CreateInstance::new(ctx.svc_uuid);
    req.params.insert("alias".to_string(), json!("mine"));

    let inst = fixtures.create_instance(req).await.unwrap();
    assert_eq!(inst.attributes.params["alias"], json!("mine"));
}

#[tokio::test]
async fn fixture_failures_propagate_unmodified() {
    let (harness, _) = start(Stub::new()).await;

    let err = harness
        .fixtures()
        .create_service(Uuid::new_v4(), None)
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, error } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(error.name(), "InternalError");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_setup_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{port}");
    let config = Config::new(&url, &url, Uuid::new_v4());
    let harness = Harness::new(&config).unwrap();

    let report = harness.run(Scenario::InvalidInputs).await;

    match report.result {
        Err(HarnessError::Setup { step, source }) => {
            assert_eq!(step, "create application");
            assert!(matches!(source, ClientError::Http(_)), "{source}");
        }
        other => panic!("expected a setup failure, got {other:?}"),
    }
}

#[tokio::test]
async fn vm_delete_leaves_the_instance_record() {
    let (harness, config) = start(Stub::new()).await;
    let ctx = ScenarioContext::generate();
    create_instance(&harness, &ctx).await;

    let http = config.http_client().unwrap();
    let vms = JsonClient::new(http.clone(), &config.vmapi_url);
    let vm_uri = format!("/vms/{}", ctx.instance_uuid);

    let reply = vms.get(&vm_uri).await.unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.unwrap()["state"], json!("running"));

    let vmapi = VmapiClient::new(http, &config);
    vmapi.delete_vm(ctx.instance_uuid).await.unwrap();

    let reply = vms.get(&vm_uri).await.unwrap();
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let uri = instance_uri(ctx.instance_uuid);
    let reply = harness.sapi().raw().get(&uri).await.unwrap();
    assert_eq!(reply.status, StatusCode::OK);

    let err = vmapi.delete_vm(ctx.instance_uuid).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    harness
        .fixtures()
        .delete_instance(ctx.instance_uuid)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_vm_job_is_reported() {
    let stub = Stub::new().with_job_outcome(JobOutcome::Failed);
    let (harness, config) = start(stub).await;
    let ctx = ScenarioContext::generate();
    create_instance(&harness, &ctx).await;

    let vmapi = VmapiClient::new(config.http_client().unwrap(), &config);
    let err = vmapi.delete_vm(ctx.instance_uuid).await.unwrap_err();

    match err {
        ClientError::Job { execution, .. } => assert_eq!(execution, "failed"),
        other => panic!("expected a failed job, got {other}"),
    }
}

#[tokio::test]
async fn unfinished_vm_job_times_out() {
    let stub = Stub::new().with_job_outcome(JobOutcome::Stuck);
    let (harness, config) = start(stub).await;
    let ctx = ScenarioContext::generate();
    create_instance(&harness, &ctx).await;

    let vmapi = VmapiClient::new(config.http_client().unwrap(), &config);
    let err = vmapi.delete_vm(ctx.instance_uuid).await.unwrap_err();

    match err {
        ClientError::JobTimeout { attempts, .. } => assert_eq!(attempts, 5),
        other => panic!("expected a job timeout, got {other}"),
    }
}

#[tokio::test]
async fn zero_poll_attempts_still_checks_the_job_once() {
    let (harness, mut config) = start(Stub::new()).await;
    let ctx = ScenarioContext::generate();
    create_instance(&harness, &ctx).await;

    config.job_poll_attempts = 0;
    let vmapi = VmapiClient::new(config.http_client().unwrap(), &config);

    vmapi.delete_vm(ctx.instance_uuid).await.unwrap();
}

#[tokio::test]
async fn stuck_vm_job_fails_the_scenario_as_a_request_error() {
    let stub = Stub::new().with_job_outcome(JobOutcome::Stuck);
    let (harness, _) = start(stub).await;

    let report = harness.run(Scenario::DeleteWithoutVm).await;

    match report.result {
        Err(HarnessError::Request { step, source }) => {
            assert_eq!(step, "delete vm");
            let timed_out = matches!(source, ClientError::JobTimeout { .. });
            assert!(timed_out, "{source}");
        }
        other => panic!("expected a request failure, got {other:?}"),
    }
}
