// Web-captions interchange format
use super::{CaptionCue, SubtitleFormatter};
use crate::error::Result;

/// Emits cues with raw numeric seconds and per-word confidences.
pub struct JsonFormatter;

impl SubtitleFormatter for JsonFormatter {
    fn format(&self, cues: &[CaptionCue]) -> String {
        serde_json::to_string_pretty(cues).unwrap_or_else(|_| "[]".to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Read cues back from a web-captions object.
pub fn parse_web_captions(json: &str) -> Result<Vec<CaptionCue>> {
    Ok(serde_json::from_str(json)?)
}
