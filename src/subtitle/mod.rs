pub mod json;
pub mod segment;
pub mod srt;

pub use json::{parse_web_captions, JsonFormatter};
pub use segment::{CaptionSegmenter, SegmenterConfig};
pub use srt::{format_timestamp, SrtFormatter};

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};

/// Lowercased word and the recognizer's confidence for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordConfidence {
    #[serde(rename = "w")]
    pub word: String,
    #[serde(rename = "c")]
    pub confidence: Option<f64>,
}

/// One displayed caption unit. Times are seconds from the start of the media.
///
/// Serializes to the web-captions interchange shape
/// (`{start, end, caption, wordConfidence: [{w, c}]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "caption")]
    pub text: String,
    #[serde(rename = "wordConfidence", default)]
    pub word_confidences: Vec<WordConfidence>,
}

pub trait SubtitleFormatter {
    fn format(&self, cues: &[CaptionCue]) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn SubtitleFormatter> {
    match format {
        OutputFormat::Srt => Box::new(SrtFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_formatter_extensions() {
        assert_eq!(create_formatter(OutputFormat::Srt).extension(), "srt");
        assert_eq!(create_formatter(OutputFormat::Json).extension(), "json");
    }
}
