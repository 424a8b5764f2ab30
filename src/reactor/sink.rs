//! Job submission sinks.

use crate::job::SynthesizedJob;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("submission request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("job '{job}' rejected with HTTP {status}: {body}")]
    Rejected { job: String, status: u16, body: String },

    #[error("job '{job}' rejected: {reason}")]
    Refused { job: String, reason: String },

    #[error("failed to encode job: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for synthesized jobs.
#[async_trait]
pub trait JobSink: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    async fn submit(&self, job: &SynthesizedJob) -> Result<(), SinkError>;
}

/// Logs each job as JSON. Nothing is executed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl JobSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn submit(&self, job: &SynthesizedJob) -> Result<(), SinkError> {
        let rendered = serde_json::to_string(job).map_err(|e| {
            warn!(job_name = %job.name(), error = %e, "Failed to encode job");
            SinkError::Encode(e)
        })?;
        info!(
            job_name = %job.name(),
            namespace = %job.namespace(),
            job = %rendered,
            "Job submitted"
        );
        Ok(())
    }
}

/// POSTs each job as JSON to an HTTP endpoint.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SinkError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl JobSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn submit(&self, job: &SynthesizedJob) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(job).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                job: job.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Collects jobs in memory. Used by dry runs and tests.
#[derive(Default)]
pub struct MemorySink {
    jobs: Mutex<Vec<SynthesizedJob>>,
    rejected_actions: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse jobs whose action-name label equals `action`.
    pub fn rejecting(mut self, action: impl Into<String>) -> Self {
        self.rejected_actions.push(action.into());
        self
    }

    pub async fn jobs(&self) -> Vec<SynthesizedJob> {
        self.jobs.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

#[async_trait]
impl JobSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn submit(&self, job: &SynthesizedJob) -> Result<(), SinkError> {
        let action = job.label(crate::job::LABEL_ACTION_NAME).unwrap_or_default();
        if self.rejected_actions.iter().any(|a| a == action) {
            return Err(SinkError::Refused {
                job: job.name().to_string(),
                reason: format!("action '{}' is not accepted", action),
            });
        }
        self.jobs.lock().await.push(job.clone());
        Ok(())
    }
}
