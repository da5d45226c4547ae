use crate::jobs::JobRecord;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionflowError {
    #[error("Missing field: {0}")]
    MissingField(String),

    /// `record` holds the terminal FAILED record when the failure came from a poll.
    #[error("Job {job_id} failed: {reason}")]
    ProviderFailure {
        job_id: String,
        reason: String,
        record: Option<Box<JobRecord>>,
    },

    #[error("Unrecognized provider status: {0}")]
    UnrecognizedStatus(String),

    #[error("Invariant violated: {0}")]
    TransformInvariantViolation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Error category carried in failure payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingField,
    ProviderFailure,
    UnrecognizedStatus,
    TransformInvariantViolation,
    Transport,
    Config,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::MissingField => "missing_field",
            ErrorKind::ProviderFailure => "provider_failure",
            ErrorKind::UnrecognizedStatus => "unrecognized_status",
            ErrorKind::TransformInvariantViolation => "transform_invariant_violation",
            ErrorKind::Transport => "transport",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        write!(f, "{}", name)
    }
}

impl CaptionflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptionflowError::MissingField(_) => ErrorKind::MissingField,
            CaptionflowError::ProviderFailure { .. } => ErrorKind::ProviderFailure,
            CaptionflowError::UnrecognizedStatus(_) => ErrorKind::UnrecognizedStatus,
            CaptionflowError::TransformInvariantViolation(_) | CaptionflowError::Json(_) => {
                ErrorKind::TransformInvariantViolation
            }
            CaptionflowError::Provider(_) | CaptionflowError::Http(_) => ErrorKind::Transport,
            CaptionflowError::Config(_) | CaptionflowError::Toml(_) => ErrorKind::Config,
            CaptionflowError::FileNotFound(_) | CaptionflowError::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptionflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            CaptionflowError::MissingField("uuid".into()).kind(),
            ErrorKind::MissingField
        );
        assert_eq!(
            CaptionflowError::ProviderFailure {
                job_id: "job-1".into(),
                reason: "bad media".into(),
                record: None,
            }
            .kind(),
            ErrorKind::ProviderFailure
        );
        assert_eq!(
            CaptionflowError::Provider("503".into()).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_provider_failure_message() {
        let err = CaptionflowError::ProviderFailure {
            job_id: "clip.mp4-1234".into(),
            reason: "Unsupported media format".into(),
            record: None,
        };
        assert_eq!(
            err.to_string(),
            "Job clip.mp4-1234 failed: Unsupported media format"
        );
        assert_eq!(ErrorKind::ProviderFailure.to_string(), "provider_failure");
    }
}
