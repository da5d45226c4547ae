use super::payload::WorkflowPayload;
use crate::config::Config;
use crate::error::{CaptionflowError, Result};
use crate::jobs::{CanonicalStatus, JobKind, JobRecord, JobSpec, JobStatusPoller};
use crate::storage::{self, ObjectStore};
use crate::subtitle::{
    parse_web_captions, CaptionSegmenter, JsonFormatter, SrtFormatter, SubtitleFormatter,
};
use crate::transcript::parse_transcript_document;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const AUDIO: &str = "Audio";
pub const TRANSCRIBE: &str = "Transcribe";
pub const WEB_CAPTIONS: &str = "WebCaptions";
pub const SRT: &str = "SRT";
pub const HLS: &str = "HLS";

/// Build the initial payload for a newly uploaded media object.
pub fn start_workflow(bucket: &str, key: &str, event_time: &str) -> Result<WorkflowPayload> {
    let file_name = key.rsplit('/').next().unwrap_or_default();
    if bucket.is_empty() || file_name.is_empty() {
        return Err(CaptionflowError::MissingField(
            "source bucket/key".to_string(),
        ));
    }

    let mut metadata = Map::new();
    metadata.insert("status".into(), "OK".into());
    metadata.insert("uuid".into(), Uuid::new_v4().to_string().into());
    metadata.insert("event_time".into(), event_time.into());
    metadata.insert("bucket".into(), bucket.into());
    metadata.insert("key".into(), key.into());
    metadata.insert("file_name".into(), file_name.into());

    info!("Starting workflow for {}", storage::s3_uri(bucket, key));
    Ok(WorkflowPayload::new(metadata))
}

/// User-visible failure: `metadata.status = FAILED` plus `{job_id, job, message, kind}`
/// under the failed stage.
///
/// A FAILED job record carried by the error replaces the stage's stored job, so
/// re-polling the failure payload never reaches the provider again. Other
/// errors keep whatever job the stage already recorded.
pub fn failure_payload(
    payload: &WorkflowPayload,
    stage: &str,
    error: &CaptionflowError,
) -> WorkflowPayload {
    warn!("Stage {} failed: {}", stage, error);

    let mut result = Map::new();
    if let Ok(previous) = payload.output(stage) {
        for field in ["job_id", "job"] {
            if let Some(value) = previous.get(field) {
                result.insert(field.into(), value.clone());
            }
        }
    }
    if let CaptionflowError::ProviderFailure {
        record: Some(record),
        ..
    } = error
    {
        result.insert("job_id".into(), record.id.clone().into());
        result.insert("job".into(), json!(record));
    }
    result.insert("message".into(), error.to_string().into());
    result.insert("kind".into(), json!(error.kind()));

    payload
        .with_status("FAILED")
        .with_output(stage, Value::Object(result))
}

/// Decode a stored object as UTF-8 text; corrupt bytes fail the stage.
fn object_text(bytes: Vec<u8>, bucket: &str, key: &str) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        CaptionflowError::TransformInvariantViolation(format!(
            "{} is not valid UTF-8: {}",
            storage::s3_uri(bucket, key),
            e
        ))
    })
}

/// The workflow's stage transformations, sharing one set of service handles.
///
/// Every stage takes the previous payload by reference and returns a new one.
/// None of them retries; errors go back to the caller as a failure of that
/// single invocation.
pub struct WorkflowStages {
    config: Config,
    poller: JobStatusPoller,
    store: Arc<dyn ObjectStore>,
    segmenter: CaptionSegmenter,
}

impl WorkflowStages {
    pub fn new(config: Config, poller: JobStatusPoller, store: Arc<dyn ObjectStore>) -> Self {
        let segmenter = CaptionSegmenter::new(config.captions);
        Self {
            config,
            poller,
            store,
            segmenter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn start_extract_audio(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let bucket = payload.metadata_str("bucket")?;
        let key = payload.metadata_str("key")?;
        let uuid = payload.metadata_str("uuid")?;

        let spec = JobSpec {
            kind: JobKind::ExtractAudio,
            name: None,
            parameters: json!({
                "role": self.config.extract_role_arn,
                "region": self.config.region,
                "input": storage::s3_uri(bucket, key),
                "destination": storage::s3_uri(bucket, &storage::output_prefix(uuid)),
                "container": "MP4",
                "audio_codec": "AAC",
                "name_modifier": "_audio",
            }),
        };

        let record = self.poller.submit(&spec).await?;
        Ok(Self::with_job(payload, AUDIO, &record, Map::new()))
    }

    pub async fn poll_extract_audio(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let record = self.poll_stage_job(payload, AUDIO).await?;

        let mut extra = Map::new();
        if record.status == CanonicalStatus::Complete {
            let bucket = payload.metadata_str("bucket")?;
            let uuid = payload.metadata_str("uuid")?;
            let file_name = payload.metadata_str("file_name")?;
            extra.insert("bucket".into(), bucket.into());
            extra.insert("key".into(), storage::audio_key(uuid, file_name).into());
        }
        Ok(Self::with_job(payload, AUDIO, &record, extra))
    }

    pub async fn start_transcribe(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let bucket = payload.output_str(AUDIO, "bucket")?;
        let key = payload.output_str(AUDIO, "key")?;
        let file_name = payload.metadata_str("file_name")?;
        let uuid = payload.metadata_str("uuid")?;

        let spec = JobSpec {
            kind: JobKind::Transcribe,
            name: Some(format!("{}-{}", file_name, uuid)),
            parameters: json!({
                "role": self.config.transcribe_role_arn,
                "region": self.config.region,
                "language_code": self.config.source_language,
                "media_uri": storage::s3_uri(bucket, key),
                "media_format": self.config.media_format,
                "output_bucket": bucket,
                "output_key": storage::transcript_key(uuid),
            }),
        };

        let record = self.poller.submit(&spec).await?;
        Ok(Self::with_job(payload, TRANSCRIBE, &record, Map::new()))
    }

    pub async fn poll_transcribe(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let record = self.poll_stage_job(payload, TRANSCRIBE).await?;

        let mut extra = Map::new();
        if record.status == CanonicalStatus::Complete {
            let bucket = payload.output_str(AUDIO, "bucket")?;
            let uuid = payload.metadata_str("uuid")?;
            extra.insert("bucket".into(), bucket.into());
            extra.insert("key".into(), storage::transcript_key(uuid).into());
        }
        Ok(Self::with_job(payload, TRANSCRIBE, &record, extra))
    }

    /// Segment the finished transcript into web captions.
    pub async fn build_web_captions(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let bucket = payload.output_str(TRANSCRIBE, "bucket")?;
        let key = payload.output_str(TRANSCRIBE, "key")?;
        let uuid = payload.metadata_str("uuid")?;

        let bytes = self.store.read_object(bucket, key).await?;
        let tokens = parse_transcript_document(&object_text(bytes, bucket, key)?)?;
        let cues = self.segmenter.segment(&tokens);

        let destination = storage::web_captions_key(uuid, &self.config.source_language);
        self.store
            .write_object(bucket, &destination, JsonFormatter.format(&cues).into_bytes())
            .await?;

        info!(
            "Wrote {} web captions from {} tokens to {}",
            cues.len(),
            tokens.len(),
            storage::s3_uri(bucket, &destination)
        );

        Ok(payload
            .with_status("COMPLETE")
            .with_output(WEB_CAPTIONS, json!({"bucket": bucket, "key": destination})))
    }

    /// Render the web captions as an SRT document.
    pub async fn build_srt(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let bucket = payload.output_str(WEB_CAPTIONS, "bucket")?;
        let key = payload.output_str(WEB_CAPTIONS, "key")?;
        let uuid = payload.metadata_str("uuid")?;

        let bytes = self.store.read_object(bucket, key).await?;
        let cues = parse_web_captions(&object_text(bytes, bucket, key)?)?;

        let destination = storage::srt_key(uuid, &self.config.target_language);
        self.store
            .write_object(bucket, &destination, SrtFormatter.format(&cues).into_bytes())
            .await?;

        info!(
            "Wrote {} SRT entries to {}",
            cues.len(),
            storage::s3_uri(bucket, &destination)
        );

        Ok(payload
            .with_status("COMPLETE")
            .with_output(SRT, json!({"bucket": bucket, "key": destination})))
    }

    /// Package the source media and SRT captions for adaptive-bitrate streaming.
    pub async fn start_hls(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let bucket = payload.metadata_str("bucket")?;
        let key = payload.metadata_str("key")?;
        let uuid = payload.metadata_str("uuid")?;
        let srt_bucket = payload.output_str(SRT, "bucket")?;
        let srt_key = payload.output_str(SRT, "key")?;

        let spec = JobSpec {
            kind: JobKind::PackageHls,
            name: None,
            parameters: json!({
                "role": self.config.extract_role_arn,
                "region": self.config.region,
                "input": storage::s3_uri(bucket, key),
                "captions": storage::s3_uri(srt_bucket, srt_key),
                "caption_language": self.config.target_language,
                "destination": storage::s3_uri(bucket, &storage::hls_prefix(uuid)),
            }),
        };

        let record = self.poller.submit(&spec).await?;
        Ok(Self::with_job(payload, HLS, &record, Map::new()))
    }

    pub async fn poll_hls(&self, payload: &WorkflowPayload) -> Result<WorkflowPayload> {
        let record = self.poll_stage_job(payload, HLS).await?;

        let mut extra = Map::new();
        if record.status == CanonicalStatus::Complete {
            let bucket = payload.metadata_str("bucket")?;
            let uuid = payload.metadata_str("uuid")?;
            let file_name = payload.metadata_str("file_name")?;
            extra.insert("bucket".into(), bucket.into());
            extra.insert(
                "key".into(),
                storage::hls_playlist_key(uuid, file_name).into(),
            );
        }
        Ok(Self::with_job(payload, HLS, &record, extra))
    }

    /// Poll the job recorded under `outputs.<stage>.job`, failing on a FAILED result.
    async fn poll_stage_job(&self, payload: &WorkflowPayload, stage: &str) -> Result<JobRecord> {
        let stored = payload
            .output(stage)?
            .get("job")
            .cloned()
            .ok_or_else(|| CaptionflowError::MissingField(format!("outputs.{}.job", stage)))?;
        let stored: JobRecord = serde_json::from_value(stored)?;

        let record = self.poller.poll(&stored).await?;
        record.ensure_not_failed()?;
        Ok(record)
    }

    fn with_job(
        payload: &WorkflowPayload,
        stage: &str,
        record: &JobRecord,
        extra: Map<String, Value>,
    ) -> WorkflowPayload {
        let mut result = extra;
        result.insert("job_id".into(), record.id.clone().into());
        result.insert("job".into(), json!(record));

        payload
            .with_status(&record.status.to_string())
            .with_output(stage, Value::Object(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_workflow_metadata() {
        let payload = start_workflow("media", "inbox/talk.mp4", "2026-10-16T09:00:00Z").unwrap();

        assert_eq!(payload.metadata_str("status").unwrap(), "OK");
        assert_eq!(payload.metadata_str("file_name").unwrap(), "talk.mp4");
        assert_eq!(payload.metadata_str("bucket").unwrap(), "media");
        assert!(Uuid::parse_str(payload.metadata_str("uuid").unwrap()).is_ok());
        assert!(payload.outputs.is_empty());
    }

    #[test]
    fn test_start_workflow_rejects_directory_key() {
        assert!(matches!(
            start_workflow("media", "inbox/", ""),
            Err(CaptionflowError::MissingField(_))
        ));
    }

    #[test]
    fn test_failure_payload() {
        let payload = start_workflow("media", "talk.mp4", "").unwrap();
        let err = CaptionflowError::ProviderFailure {
            job_id: "talk.mp4-1".into(),
            reason: "Unsupported codec".into(),
            record: None,
        };

        let failed = failure_payload(&payload, TRANSCRIBE, &err);

        assert_eq!(failed.metadata_str("status").unwrap(), "FAILED");
        assert_eq!(
            failed.output_str(TRANSCRIBE, "message").unwrap(),
            "Job talk.mp4-1 failed: Unsupported codec"
        );
        assert_eq!(failed.output_str(TRANSCRIBE, "kind").unwrap(), "provider_failure");
        assert_eq!(payload.metadata_str("status").unwrap(), "OK");
    }

    #[test]
    fn test_failure_payload_keeps_stored_job() {
        let record = JobRecord::submitted("talk.mp4-1", JobKind::Transcribe);
        let payload = start_workflow("media", "talk.mp4", "")
            .unwrap()
            .with_output(TRANSCRIBE, json!({"job_id": "talk.mp4-1", "job": record}));
        let err = CaptionflowError::Provider("Job provider error (503): throttled".into());

        let failed = failure_payload(&payload, TRANSCRIBE, &err);

        assert_eq!(failed.output_str(TRANSCRIBE, "job_id").unwrap(), "talk.mp4-1");
        assert_eq!(failed.output(TRANSCRIBE).unwrap()["job"]["status"], "SUBMITTED");
        assert_eq!(failed.output_str(TRANSCRIBE, "kind").unwrap(), "transport");
    }
}
