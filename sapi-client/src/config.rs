use std::time::Duration;

use clap::Args;
use uuid::Uuid;

pub const DEFAULT_VMAPI_URL: &str = "http://10.2.206.23";

/// Where the services live and how patiently to talk to them.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Base URL of the Services API.
    #[arg(long, env = "SAPI_URL")]
    pub sapi_url: String,

    /// Base URL of the VM API.
    #[arg(long, env = "VMAPI_URL", default_value = DEFAULT_VMAPI_URL)]
    pub vmapi_url: String,

    /// Owner of the test applications.
    #[arg(long, env = "ADMIN_UUID")]
    pub admin_uuid: Uuid,

    /// Image the test application is pinned to, if any.
    #[arg(long, env = "IMAGE_UUID")]
    pub image_uuid: Option<Uuid>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Delay between VM job status checks, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub job_poll_ms: u64,

    /// Number of VM job status checks before giving up.
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..))]
    pub job_poll_attempts: u32,
}

impl Config {
    pub fn new(
        sapi_url: impl Into<String>,
        vmapi_url: impl Into<String>,
        admin_uuid: Uuid,
    ) -> Self {
        Self {
            sapi_url: sapi_url.into(),
            vmapi_url: vmapi_url.into(),
            admin_uuid,
            image_uuid: None,
            timeout_secs: 60,
            job_poll_ms: 1000,
            job_poll_attempts: 300,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.job_poll_ms)
    }

    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(15))
            .timeout(self.timeout())
            .build()
    }
}
