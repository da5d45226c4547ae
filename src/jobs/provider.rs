use super::JobKind;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request to start a remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: JobKind,
    /// Caller-chosen job name, for providers that key jobs by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub id: String,
}

/// Raw status as reported by the provider, before canonical mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub status: String,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A service that runs encoder/transcriber jobs asynchronously.
#[async_trait]
pub trait JobProvider: Send + Sync {
    async fn submit_job(&self, spec: &JobSpec) -> Result<SubmittedJob>;
    async fn get_job_status(&self, id: &str) -> Result<ProviderStatus>;
    fn name(&self) -> &'static str;
}
