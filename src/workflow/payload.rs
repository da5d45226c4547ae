use crate::error::{CaptionflowError, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format of `metadata.last_update`, e.g. `16-Oct-2026 (09:15:02.123456)`.
pub const LAST_UPDATE_FORMAT: &str = "%d-%b-%Y (%H:%M:%S.%6f)";

/// State threaded through every stage. Stages never mutate a payload they were
/// given; each `with_*` call returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPayload {
    pub metadata: Map<String, Value>,
    #[serde(alias = "Outputs")]
    pub outputs: Map<String, Value>,
}

impl WorkflowPayload {
    pub fn new(metadata: Map<String, Value>) -> Self {
        Self {
            metadata,
            outputs: Map::new(),
        }
    }

    /// Decode a wire payload, requiring both top-level sections.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(CaptionflowError::TransformInvariantViolation(
                "payload is not a JSON object".to_string(),
            ));
        };

        let metadata = take_section(&mut object, &["metadata"])?;
        let outputs = take_section(&mut object, &["outputs", "Outputs"])?;
        Ok(Self { metadata, outputs })
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({
            "metadata": self.metadata,
            "outputs": self.outputs,
        })
    }

    pub fn metadata_str(&self, key: &str) -> Result<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| CaptionflowError::MissingField(format!("metadata.{}", key)))
    }

    pub fn output(&self, stage: &str) -> Result<&Map<String, Value>> {
        self.outputs
            .get(stage)
            .and_then(Value::as_object)
            .ok_or_else(|| CaptionflowError::MissingField(format!("outputs.{}", stage)))
    }

    pub fn output_str(&self, stage: &str, key: &str) -> Result<&str> {
        self.output(stage)?
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| CaptionflowError::MissingField(format!("outputs.{}.{}", stage, key)))
    }

    pub fn with_metadata(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.to_string(), value.into());
        next
    }

    pub fn with_output(&self, stage: &str, result: Value) -> Self {
        let mut next = self.clone();
        next.outputs.insert(stage.to_string(), result);
        next
    }

    /// Stamp `metadata.status` and `metadata.last_update`.
    pub fn with_status(&self, status: &str) -> Self {
        self.with_metadata("status", status)
            .with_metadata("last_update", Local::now().format(LAST_UPDATE_FORMAT).to_string())
    }
}

fn take_section(object: &mut Map<String, Value>, names: &[&str]) -> Result<Map<String, Value>> {
    let found = names.iter().find_map(|name| object.remove(*name));
    match found {
        Some(Value::Object(section)) => Ok(section),
        Some(other) => Err(CaptionflowError::TransformInvariantViolation(format!(
            "{} must be an object, got {}",
            names[0], other
        ))),
        None => Err(CaptionflowError::MissingField(names[0].to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_legacy_outputs_key() {
        let payload = WorkflowPayload::from_value(json!({
            "metadata": {"uuid": "abc"},
            "Outputs": {"SRT": {"bucket": "media", "key": "k"}}
        }))
        .unwrap();

        assert_eq!(payload.metadata_str("uuid").unwrap(), "abc");
        assert_eq!(payload.output_str("SRT", "bucket").unwrap(), "media");
    }

    #[test]
    fn test_from_value_missing_sections() {
        assert!(matches!(
            WorkflowPayload::from_value(json!({"metadata": {}})),
            Err(CaptionflowError::MissingField(ref f)) if f == "outputs"
        ));
        assert!(matches!(
            WorkflowPayload::from_value(json!({"outputs": {}})),
            Err(CaptionflowError::MissingField(ref f)) if f == "metadata"
        ));
        assert!(matches!(
            WorkflowPayload::from_value(json!({"metadata": [], "outputs": {}})),
            Err(CaptionflowError::TransformInvariantViolation(_))
        ));
        assert!(matches!(
            WorkflowPayload::from_value(json!("payload")),
            Err(CaptionflowError::TransformInvariantViolation(_))
        ));
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let original = WorkflowPayload::default().with_metadata("uuid", "abc");
        let next = original
            .with_output("SRT", json!({"key": "k"}))
            .with_status("COMPLETE");

        assert!(original.outputs.is_empty());
        assert!(original.metadata.get("status").is_none());
        assert_eq!(next.metadata_str("status").unwrap(), "COMPLETE");
        assert!(next.metadata_str("last_update").is_ok());
        assert_eq!(next.metadata_str("uuid").unwrap(), "abc");
    }

    #[test]
    fn test_missing_field_paths() {
        let payload = WorkflowPayload::default().with_output("Audio", json!({"job_id": "j"}));

        assert!(matches!(
            payload.metadata_str("uuid"),
            Err(CaptionflowError::MissingField(ref f)) if f == "metadata.uuid"
        ));
        assert!(matches!(
            payload.output_str("Audio", "bucket"),
            Err(CaptionflowError::MissingField(ref f)) if f == "outputs.Audio.bucket"
        ));
        assert!(payload.output("SRT").is_err());
    }
}
