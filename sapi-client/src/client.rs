use reqwest::{Method, StatusCode};
use sapi::{
    application::{Application, CreateApplication},
    instance::{CreateInstance, Instance, InstancePayload},
    manifest::{CreateManifest, Manifest},
    service::{CreateService, Service},
    UpdateRequest,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::ClientError;

pub const APPLICATIONS: &str = "/applications";
pub const SERVICES: &str = "/services";
pub const INSTANCES: &str = "/instances";
pub const MANIFESTS: &str = "/manifests";

pub fn instance_uri(uuid: Uuid) -> String {
    format!("{INSTANCES}/{uuid}")
}

/// Status and decoded body of one HTTP exchange, whatever the status.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The restify error carried by a non-2xx reply.
    ///
    /// Bodies that are not a restify error still yield one, named after the
    /// status.
    pub fn error(&self) -> Option<sapi::Error> {
        if self.is_success() {
            return None;
        }

        let parsed = self
            .body
            .clone()
            .and_then(|body| serde_json::from_value::<sapi::Error>(body).ok());

        Some(parsed.unwrap_or_else(|| {
            let reason = self.status.canonical_reason().unwrap_or("Unknown");
            let message = match &self.body {
                Some(Value::String(text)) => text.clone(),
                _ => format!("unexpected status {}", self.status),
            };
            sapi::Error::new(reason.replace(' ', ""), message)
        }))
    }

    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        if let Some(error) = self.error() {
            return Err(ClientError::Api {
                status: self.status,
                error,
            });
        }

        let body = self.body.unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|source| ClientError::Decode {
            status: self.status,
            source,
        })
    }

    pub fn into_empty(self) -> Result<(), ClientError> {
        match self.error() {
            Some(error) => Err(ClientError::Api {
                status: self.status,
                error,
            }),
            None => Ok(()),
        }
    }
}

/// JSON-over-HTTP client rooted at one base URL.
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: reqwest::Client,
    base_url: String,
}

impl JsonClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Only a successful reply must carry JSON; an error reply whose body is
    /// not JSON keeps the raw text as a string body.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        uri: &str,
        body: Option<&B>,
    ) -> Result<Reply, ClientError> {
        let url = format!("{}{}", self.base_url, uri);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(body) = body {
            let body = serde_json::to_string(body).map_err(ClientError::Encode)?;
            req = req.header("Content-Type", "application/json").body(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        debug!(%method, %url, %status, "exchange");

        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(body) => Some(body),
                Err(source) if status.is_success() => {
                    return Err(ClientError::Decode { status, source });
                }
                Err(_) => Some(Value::String(text)),
            }
        };

        Ok(Reply { status, body })
    }

    pub async fn get(&self, uri: &str) -> Result<Reply, ClientError> {
        self.send::<Value>(Method::GET, uri, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &B,
    ) -> Result<Reply, ClientError> {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &B,
    ) -> Result<Reply, ClientError> {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn del(&self, uri: &str) -> Result<Reply, ClientError> {
        self.send::<Value>(Method::DELETE, uri, None).await
    }
}

/// Typed client for the Services API.
#[derive(Debug, Clone)]
pub struct SapiClient {
    json: JsonClient,
}

impl SapiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            json: JsonClient::new(http, base_url),
        }
    }

    /// Untyped access for status-level assertions.
    pub fn raw(&self) -> &JsonClient {
        &self.json
    }

    pub async fn create_application(
        &self,
        req: &CreateApplication,
    ) -> Result<Application, ClientError> {
        self.json.post(APPLICATIONS, req).await?.into_result()
    }

    pub async fn get_application(&self, uuid: Uuid) -> Result<Application, ClientError> {
        let uri = format!("{APPLICATIONS}/{uuid}");
        self.json.get(&uri).await?.into_result()
    }

    pub async fn delete_application(&self, uuid: Uuid) -> Result<(), ClientError> {
        let uri = format!("{APPLICATIONS}/{uuid}");
        self.json.del(&uri).await?.into_empty()
    }

    pub async fn create_service(&self, req: &CreateService) -> Result<Service, ClientError> {
        self.json.post(SERVICES, req).await?.into_result()
    }

    pub async fn get_service(&self, uuid: Uuid) -> Result<Service, ClientError> {
        let uri = format!("{SERVICES}/{uuid}");
        self.json.get(&uri).await?.into_result()
    }

    pub async fn delete_service(&self, uuid: Uuid) -> Result<(), ClientError> {
        let uri = format!("{SERVICES}/{uuid}");
        self.json.del(&uri).await?.into_empty()
    }

    pub async fn create_manifest(&self, req: &CreateManifest) -> Result<Manifest, ClientError> {
        self.json.post(MANIFESTS, req).await?.into_result()
    }

    pub async fn get_manifest(&self, uuid: Uuid) -> Result<Manifest, ClientError> {
        let uri = format!("{MANIFESTS}/{uuid}");
        self.json.get(&uri).await?.into_result()
    }

    pub async fn delete_manifest(&self, uuid: Uuid) -> Result<(), ClientError> {
        let uri = format!("{MANIFESTS}/{uuid}");
        self.json.del(&uri).await?.into_empty()
    }

    pub async fn create_instance(&self, req: &CreateInstance) -> Result<Instance, ClientError> {
        self.json.post(INSTANCES, req).await?.into_result()
    }

    pub async fn get_instance(&self, uuid: Uuid) -> Result<Instance, ClientError> {
        self.json.get(&instance_uri(uuid)).await?.into_result()
    }

    pub async fn list_instances(
        &self,
        service_uuid: Option<Uuid>,
    ) -> Result<Vec<Instance>, ClientError> {
        let uri = match service_uuid {
            Some(uuid) => format!("{INSTANCES}?service_uuid={uuid}"),
            None => INSTANCES.to_string(),
        };

        self.json.get(&uri).await?.into_result()
    }

    pub async fn get_instance_payload(&self, uuid: Uuid) -> Result<InstancePayload, ClientError> {
        let uri = format!("{}/payload", instance_uri(uuid));
        self.json.get(&uri).await?.into_result()
    }

    pub async fn delete_instance(&self, uuid: Uuid) -> Result<(), ClientError> {
        self.json.del(&instance_uri(uuid)).await?.into_empty()
    }

    /// `PUT` a partial update to any resource URI and return the raw reply.
    pub async fn update(&self, uri: &str, req: &UpdateRequest) -> Result<Reply, ClientError> {
        self.json.put(uri, req).await
    }
}
