//! Long-running provider jobs: canonical status, job records and polling.

pub mod http;
pub mod poller;
pub mod provider;

pub use http::HttpJobProvider;
pub use poller::JobStatusPoller;
pub use provider::{JobProvider, JobSpec, ProviderStatus, SubmittedJob};

use crate::error::{CaptionflowError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-independent job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Submitted,
    InProgress,
    Complete,
    Failed,
}

impl CanonicalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CanonicalStatus::Complete | CanonicalStatus::Failed)
    }

    /// SUBMITTED → IN_PROGRESS → {COMPLETE | FAILED}, with IN_PROGRESS looping on itself.
    /// A job may also finish before it is first observed in progress.
    pub fn can_transition_to(&self, next: CanonicalStatus) -> bool {
        use CanonicalStatus::*;
        match self {
            Submitted => matches!(next, InProgress | Complete | Failed),
            InProgress => matches!(next, InProgress | Complete | Failed),
            Complete | Failed => false,
        }
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalStatus::Submitted => write!(f, "SUBMITTED"),
            CanonicalStatus::InProgress => write!(f, "IN_PROGRESS"),
            CanonicalStatus::Complete => write!(f, "COMPLETE"),
            CanonicalStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Map a provider status string onto the canonical vocabulary.
pub fn canonical_status(raw: &str) -> Result<CanonicalStatus> {
    match raw {
        "IN_PROGRESS" | "PROGRESSING" => Ok(CanonicalStatus::InProgress),
        "COMPLETE" | "COMPLETED" => Ok(CanonicalStatus::Complete),
        "FAILED" => Ok(CanonicalStatus::Failed),
        _ => Err(CaptionflowError::UnrecognizedStatus(raw.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ExtractAudio,
    Transcribe,
    PackageHls,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::ExtractAudio => write!(f, "extract_audio"),
            JobKind::Transcribe => write!(f, "transcribe"),
            JobKind::PackageHls => write!(f, "package_hls"),
        }
    }
}

/// Last observed state of a remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub kind: JobKind,
    pub status: CanonicalStatus,
    pub last_update: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn submitted(id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: CanonicalStatus::Submitted,
            last_update: Utc::now(),
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Turn a FAILED record into a `ProviderFailure` carrying the provider's reason
    /// and the record itself.
    pub fn ensure_not_failed(&self) -> Result<()> {
        if self.status == CanonicalStatus::Failed {
            return Err(CaptionflowError::ProviderFailure {
                job_id: self.id.clone(),
                reason: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "no failure reason reported".to_string()),
                record: Some(Box::new(self.clone())),
            });
        }
        Ok(())
    }
}
