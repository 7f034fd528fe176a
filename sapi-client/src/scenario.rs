use std::collections::BTreeMap;

use reqwest::StatusCode;
use sapi::instance::{CreateInstance, Instance};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    assert::{expect_body, expect_eq, expect_rejection, expect_status, expect_true},
    client::{Reply, SapiClient, INSTANCES},
    config::Config,
    error::{AssertionFailure, HarnessError},
    fixture::{Fixtures, ScenarioContext},
    verify::verify_updates,
    vmapi::VmapiClient,
};

pub const MANIFEST_KEY: &str = "my_service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    /// Instance creation without or with a bogus service.
    InvalidInputs,
    /// Full create/read/list/payload/update/delete cycle of one instance.
    PutGetDel,
    /// Deleting an instance whose VM was already destroyed.
    DeleteWithoutVm,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::InvalidInputs,
        Scenario::PutGetDel,
        Scenario::DeleteWithoutVm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::InvalidInputs => "create w/ invalid inputs",
            Scenario::PutGetDel => "put/get/del instance",
            Scenario::DeleteWithoutVm => "delete instance with no VM",
        }
    }
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub result: Result<(), HarnessError>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a scenario needs to talk to SAPI and VMAPI.
#[derive(Debug, Clone)]
pub struct Harness {
    fixtures: Fixtures,
    vmapi: VmapiClient,
}

impl Harness {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = config.http_client()?;
        let sapi = SapiClient::new(http.clone(), &config.sapi_url);

        Ok(Self {
            fixtures: Fixtures::new(sapi, config),
            vmapi: VmapiClient::new(http, config),
        })
    }

    pub fn sapi(&self) -> &SapiClient {
        self.fixtures.sapi()
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    pub async fn run(&self, scenario: Scenario) -> ScenarioReport {
        let ctx = ScenarioContext::generate();

        info!(scenario = scenario.name(), instance = %ctx.instance_uuid, "scenario started");

        let result = match scenario {
            Scenario::InvalidInputs => self.create_with_invalid_inputs(ctx).await,
            Scenario::PutGetDel => self.put_get_del_instance(ctx).await,
            Scenario::DeleteWithoutVm => self.delete_instance_with_no_vm(ctx).await,
        };

        match &result {
            Ok(()) => info!(scenario = scenario.name(), "scenario passed"),
            Err(err) => warn!(scenario = scenario.name(), %err, "scenario failed"),
        }

        ScenarioReport { scenario, result }
    }

    /// Run scenarios one after another; a failure does not stop the rest.
    pub async fn run_all(&self, scenarios: &[Scenario]) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(scenarios.len());

        for scenario in scenarios {
            reports.push(self.run(*scenario).await);
        }

        reports
    }

    async fn setup_parents(&self, ctx: &ScenarioContext) -> Result<(), HarnessError> {
        self.fixtures
            .create_application(Some(ctx.app_uuid))
            .await
            .map_err(HarnessError::setup("create application"))?;
        self.fixtures
            .create_service(ctx.app_uuid, Some(ctx.svc_uuid))
            .await
            .map_err(HarnessError::setup("create service"))?;

        Ok(())
    }

    async fn teardown_parents(&self, ctx: &ScenarioContext) -> Result<(), HarnessError> {
        if let Some(manifest_uuid) = ctx.manifest_uuid {
            self.fixtures
                .delete_manifest(manifest_uuid)
                .await
                .map_err(HarnessError::setup("delete manifest"))?;
        }
        self.fixtures
            .delete_service(ctx.svc_uuid)
            .await
            .map_err(HarnessError::setup("delete service"))?;
        self.fixtures
            .delete_application(ctx.app_uuid)
            .await
            .map_err(HarnessError::setup("delete application"))?;

        Ok(())
    }

    async fn get(&self, step: &str, uri: &str) -> Result<Reply, HarnessError> {
        let reply = self.sapi().raw().get(uri).await;
        reply.map_err(HarnessError::request(step))
    }

    async fn post<B>(&self, step: &str, body: &B) -> Result<Reply, HarnessError>
    where
        B: Serialize + ?Sized,
    {
        let reply = self.sapi().raw().post(INSTANCES, body).await;
        reply.map_err(HarnessError::request(step))
    }

    async fn del(&self, step: &str, uri: &str) -> Result<Reply, HarnessError> {
        let reply = self.sapi().raw().del(uri).await;
        reply.map_err(HarnessError::request(step))
    }

    pub async fn create_with_invalid_inputs(
        &self,
        ctx: ScenarioContext,
    ) -> Result<(), HarnessError> {
        self.setup_parents(&ctx).await?;

        let step = "create without service_uuid";
        let bad = CreateInstance {
            uuid: Some(ctx.instance_uuid),
            ..Default::default()
        };
        let reply = self.post(step, &bad).await?;
        let name = Some("MissingParameterError");
        expect_rejection(step, &reply, StatusCode::CONFLICT, name)?;

        let step = "create with unknown service_uuid";
        let bad = CreateInstance {
            uuid: Some(ctx.instance_uuid),
            ..CreateInstance::new(Uuid::new_v4())
        };
        let reply = self.post(step, &bad).await?;
        expect_rejection(step, &reply, StatusCode::INTERNAL_SERVER_ERROR, None)?;

        self.teardown_parents(&ctx).await
    }

    pub async fn put_get_del_instance(
        &self,
        mut ctx: ScenarioContext,
    ) -> Result<(), HarnessError> {
        let uri = ctx.instance_uri();

        let mut inst = CreateInstance {
            uuid: Some(ctx.instance_uuid),
            metadata: sample_metadata(),
            wait: true,
            ..CreateInstance::new(ctx.svc_uuid)
        };

        self.setup_parents(&ctx).await?;

        let manifest = self
            .fixtures
            .create_manifest(None)
            .await
            .map_err(HarnessError::setup("create manifest"))?;
        ctx.manifest_uuid = Some(manifest.uuid);
        inst.manifests = manifests(manifest.uuid);

        let step = "read before create";
        let reply = self.get(step, &uri).await?;
        expect_status(step, &reply, StatusCode::NOT_FOUND)?;

        let step = "create with unknown manifest";
        let mut bad = inst.clone();
        bad.manifests = manifests(Uuid::new_v4());
        let reply = self.post(step, &bad).await?;
        expect_rejection(step, &reply, StatusCode::INTERNAL_SERVER_ERROR, None)?;

        let step = "create";
        let reply = self.post(step, &inst).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        check_instance(step, &inst, &expect_body(step, &reply)?)?;

        let step = "read";
        let reply = self.get(step, &uri).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        check_instance(step, &inst, &expect_body(step, &reply)?)?;

        let step = "list by service";
        let by_service = format!("{INSTANCES}?service_uuid={}", ctx.svc_uuid);
        let reply = self.get(step, &by_service).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        let listed: Vec<Instance> = expect_body(step, &reply)?;
        check_listed(step, &inst, &listed)?;

        let step = "list all";
        let reply = self.get(step, INSTANCES).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        let listed: Vec<Instance> = expect_body(step, &reply)?;
        check_listed(step, &inst, &listed)?;

        let step = "payload";
        let reply = self.get(step, &format!("{uri}/payload")).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        let present = reply.body.as_ref().is_some_and(|body| !body.is_null());
        expect_true(step, "payload present", present)?;

        verify_updates(self.sapi(), &uri).await?;

        let step = "delete";
        let reply = self.del(step, &uri).await?;
        expect_status(step, &reply, StatusCode::NO_CONTENT)?;

        let step = "read after delete";
        let reply = self.get(step, &uri).await?;
        expect_status(step, &reply, StatusCode::NOT_FOUND)?;

        self.teardown_parents(&ctx).await
    }

    pub async fn delete_instance_with_no_vm(
        &self,
        ctx: ScenarioContext,
    ) -> Result<(), HarnessError> {
        let uri = ctx.instance_uri();

        let inst = CreateInstance {
            uuid: Some(ctx.instance_uuid),
            wait: true,
            ..CreateInstance::new(ctx.svc_uuid)
        };

        self.setup_parents(&ctx).await?;

        let step = "create";
        let reply = self.post(step, &inst).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        check_identity(step, &inst, &expect_body(step, &reply)?)?;

        let step = "read";
        let reply = self.get(step, &uri).await?;
        expect_status(step, &reply, StatusCode::OK)?;
        check_identity(step, &inst, &expect_body(step, &reply)?)?;

        // The VM goes away while the instance record stays behind.
        self.vmapi
            .delete_vm(ctx.instance_uuid)
            .await
            .map_err(HarnessError::request("delete vm"))?;

        let step = "delete";
        let reply = self.del(step, &uri).await?;
        expect_status(step, &reply, StatusCode::NO_CONTENT)?;

        self.teardown_parents(&ctx).await
    }
}

fn manifests(uuid: Uuid) -> BTreeMap<String, Uuid> {
    BTreeMap::from([(MANIFEST_KEY.to_string(), uuid)])
}

/// Metadata of every JSON kind, nested values included.
pub fn sample_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("string_val".to_string(), json!("my string"));
    metadata.insert("num_val".to_string(), json!(123));
    metadata.insert("bool_val".to_string(), json!(true));
    metadata.insert("array_val".to_string(), json!([1, 2, 3]));
    metadata.insert("obj_val".to_string(), json!({ "foo": "baz" }));
    metadata
}

fn check_identity(
    step: &str,
    expected: &CreateInstance,
    actual: &Instance,
) -> Result<(), AssertionFailure> {
    expect_eq(step, "uuid", &expected.uuid, &Some(actual.uuid))?;

    let service_uuid = Some(actual.service_uuid);
    expect_eq(step, "service_uuid", &expected.service_uuid, &service_uuid)
}

fn check_instance(
    step: &str,
    expected: &CreateInstance,
    actual: &Instance,
) -> Result<(), AssertionFailure> {
    check_identity(step, expected, actual)?;

    let metadata = &actual.attributes.metadata;
    expect_eq(step, "metadata", &expected.metadata, metadata)?;
    expect_eq(step, "manifests", &expected.manifests, &actual.manifests)
}

fn check_listed(
    step: &str,
    expected: &CreateInstance,
    listed: &[Instance],
) -> Result<(), AssertionFailure> {
    expect_true(step, "listing is not empty", !listed.is_empty())?;

    let found = listed
        .iter()
        .find(|inst| Some(inst.uuid) == expected.uuid)
        .ok_or_else(|| AssertionFailure {
            step: step.to_string(),
            what: "instance listed".to_string(),
            expected: json!(expected.uuid),
            actual: listed.iter().map(|inst| json!(inst.uuid)).collect(),
        })?;

    check_instance(step, expected, found)
}
