use sapi::{
    application::{Application, CreateApplication},
    instance::{CreateInstance, Instance},
    manifest::{CreateManifest, Manifest},
    service::{CreateService, Service},
    Attributes,
};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::{client::SapiClient, config::Config, error::ClientError};

pub const IMAGE_UUID: &str = "1eddb7ec-3e1d-423a-b876-f6e069496f35";

pub const APPLICATION_NAME: &str = "empty_test_application";
pub const SERVICE_NAME: &str = "empty_test_service";
pub const MANIFEST_NAME: &str = "more_or_less_empty test config";
pub const MANIFEST_PATH: &str = "/var/tmp/config.json";
pub const MANIFEST_TEMPLATE: &str = "{ logLevel: \"debug\" }";

/// `sapitest-` followed by eight random hex digits.
pub fn generate_alias() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("sapitest-{}", &uuid[..8])
}

/// Identifiers one scenario creates and later tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioContext {
    pub app_uuid: Uuid,
    pub svc_uuid: Uuid,
    pub instance_uuid: Uuid,
    pub manifest_uuid: Option<Uuid>,
}

impl ScenarioContext {
    pub fn generate() -> Self {
        Self {
            app_uuid: Uuid::new_v4(),
            svc_uuid: Uuid::new_v4(),
            instance_uuid: Uuid::new_v4(),
            manifest_uuid: None,
        }
    }

    pub fn instance_uri(&self) -> String {
        crate::client::instance_uri(self.instance_uuid)
    }
}

/// Creates and destroys the application/service/manifest/instance hierarchy.
///
/// Every failure is handed back untouched; callers decide to abort.
#[derive(Debug, Clone)]
pub struct Fixtures {
    sapi: SapiClient,
    admin_uuid: Uuid,
    image_uuid: Option<Uuid>,
}

impl Fixtures {
    pub fn new(sapi: SapiClient, config: &Config) -> Self {
        Self {
            sapi,
            admin_uuid: config.admin_uuid,
            image_uuid: config.image_uuid,
        }
    }

    pub fn sapi(&self) -> &SapiClient {
        &self.sapi
    }

    pub async fn create_application(&self, uuid: Option<Uuid>) -> Result<Application, ClientError> {
        let mut params = Map::new();
        if let Some(image_uuid) = self.image_uuid {
            params.insert("image_uuid".to_string(), json!(image_uuid));
        }

        let app = self
            .sapi
            .create_application(&CreateApplication {
                name: APPLICATION_NAME.to_string(),
                owner_uuid: self.admin_uuid,
                uuid,
                attributes: Attributes {
                    params,
                    metadata: Map::new(),
                },
            })
            .await?;

        info!(uuid = %app.uuid, "created application");
        Ok(app)
    }

    pub async fn create_service(
        &self,
        app_uuid: Uuid,
        uuid: Option<Uuid>,
    ) -> Result<Service, ClientError> {
        let mut params = Map::new();
        params.insert("ram".to_string(), json!(256));
        params.insert("networks".to_string(), json!(["admin"]));
        params.insert("image_uuid".to_string(), json!(IMAGE_UUID));

        let svc = self
            .sapi
            .create_service(&CreateService {
                name: SERVICE_NAME.to_string(),
                application_uuid: app_uuid,
                uuid,
                attributes: Attributes {
                    params,
                    metadata: Map::new(),
                },
            })
            .await?;

        info!(uuid = %svc.uuid, application = %app_uuid, "created service");
        Ok(svc)
    }

    pub async fn create_manifest(&self, uuid: Option<Uuid>) -> Result<Manifest, ClientError> {
        let manifest = self
            .sapi
            .create_manifest(&CreateManifest {
                name: MANIFEST_NAME.to_string(),
                path: MANIFEST_PATH.to_string(),
                template: Value::String(MANIFEST_TEMPLATE.to_string()),
                uuid,
            })
            .await?;

        info!(uuid = %manifest.uuid, "created manifest");
        Ok(manifest)
    }

    /// Create an instance, giving it a fresh `sapitest-` alias unless `req`
    /// already names one.
    pub async fn create_instance(&self, mut req: CreateInstance) -> Result<Instance, ClientError> {
        if req.alias().is_none() {
            let alias = Value::String(generate_alias());
            req.params.insert("alias".to_string(), alias);
        }

        let inst = self.sapi.create_instance(&req).await?;

        info!(uuid = %inst.uuid, service = %inst.service_uuid, "created instance");
        Ok(inst)
    }

    pub async fn delete_instance(&self, uuid: Uuid) -> Result<(), ClientError> {
        self.sapi.delete_instance(uuid).await
    }

    pub async fn delete_manifest(&self, uuid: Uuid) -> Result<(), ClientError> {
        self.sapi.delete_manifest(uuid).await
    }

    pub async fn delete_service(&self, uuid: Uuid) -> Result<(), ClientError> {
        self.sapi.delete_service(uuid).await
    }

    pub async fn delete_application(&self, uuid: Uuid) -> Result<(), ClientError> {
        self.sapi.delete_application(uuid).await
    }
}
