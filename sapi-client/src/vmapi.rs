use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{client::JsonClient, config::Config, error::ClientError};

/// Reply to an asynchronous VMAPI request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRef {
    pub vm_uuid: Uuid,
    pub job_uuid: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub uuid: Uuid,
    /// `queued`, `running`, `succeeded`, `failed` or `canceled`.
    pub execution: String,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        matches!(self.execution.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// VMAPI client that waits for the jobs it starts.
#[derive(Debug, Clone)]
pub struct VmapiClient {
    json: JsonClient,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl VmapiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            json: JsonClient::new(http, &config.vmapi_url),
            poll_interval: config.job_poll_interval(),
            poll_attempts: config.job_poll_attempts.max(1),
        }
    }

    /// Destroy a VM and block until its job completes.
    pub async fn delete_vm(&self, uuid: Uuid) -> Result<(), ClientError> {
        let uri = format!("/vms/{uuid}");
        let job: JobRef = self.json.del(&uri).await?.into_result()?;

        info!(vm = %uuid, job = %job.job_uuid, "vm delete started");

        self.wait_for_job(job.job_uuid).await
    }

    /// Poll the job at least once, then until it finishes or the attempts run out.
    pub async fn wait_for_job(&self, job_uuid: Uuid) -> Result<(), ClientError> {
        let uri = format!("/jobs/{job_uuid}");

        for attempt in 1..=self.poll_attempts {
            let job: Job = self.json.get(&uri).await?.into_result()?;

            debug!(job = %job_uuid, attempt, execution = %job.execution, "polled job");

            if job.is_finished() {
                return match job.execution.as_str() {
                    "succeeded" => Ok(()),
                    _ => Err(ClientError::Job {
                        job_uuid,
                        execution: job.execution,
                    }),
                };
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ClientError::JobTimeout {
            job_uuid,
            attempts: self.poll_attempts,
        })
    }
}
