use super::provider::{JobProvider, JobSpec};
use super::{canonical_status, CanonicalStatus, JobRecord};
use crate::error::{CaptionflowError, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Submits jobs and performs exactly one status transition per poll.
///
/// Polling cadence belongs to the caller; a terminal record is returned
/// unchanged without contacting the provider, so re-invocation is always safe.
#[derive(Clone)]
pub struct JobStatusPoller {
    provider: Arc<dyn JobProvider>,
}

impl JobStatusPoller {
    pub fn new(provider: Arc<dyn JobProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Start a remote job. Submission failures surface immediately.
    pub async fn submit(&self, spec: &JobSpec) -> Result<JobRecord> {
        let submitted = self.provider.submit_job(spec).await?;
        info!(
            "Submitted {} job {} to {}",
            spec.kind,
            submitted.id,
            self.provider.name()
        );
        Ok(JobRecord::submitted(submitted.id, spec.kind))
    }

    /// Observe the job behind `record` once and return its next state.
    pub async fn poll(&self, record: &JobRecord) -> Result<JobRecord> {
        if record.is_terminal() {
            debug!(
                "Job {} already {}, not querying provider",
                record.id, record.status
            );
            return Ok(record.clone());
        }

        let reported = self.provider.get_job_status(&record.id).await?;

        let (status, error) = match canonical_status(&reported.status) {
            Ok(CanonicalStatus::Failed) => (
                CanonicalStatus::Failed,
                Some(
                    reported
                        .failure_reason
                        .unwrap_or_else(|| format!("Provider reported FAILED for job {}", record.id)),
                ),
            ),
            Ok(status) => (status, None),
            Err(e @ CaptionflowError::UnrecognizedStatus(_)) => {
                warn!("Job {}: {}, treating as FAILED", record.id, e);
                (CanonicalStatus::Failed, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

        if !record.status.can_transition_to(status) {
            return Err(CaptionflowError::TransformInvariantViolation(format!(
                "job {} cannot move from {} to {}",
                record.id, record.status, status
            )));
        }

        if status != record.status {
            info!("Job {} ({}): {} -> {}", record.id, record.kind, record.status, status);
        }

        Ok(JobRecord {
            id: record.id.clone(),
            kind: record.kind,
            status,
            last_update: Utc::now(),
            error,
        })
    }

    /// Poll several independent jobs concurrently; results keep input order.
    pub async fn poll_all(&self, records: &[JobRecord]) -> Vec<Result<JobRecord>> {
        join_all(records.iter().map(|record| self.poll(record))).await
    }
}
