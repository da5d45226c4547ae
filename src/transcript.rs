//! Timed tokens produced by the speech provider, and parsing of its transcript document.

use crate::error::{CaptionflowError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Punctuation,
}

/// One recognized item. Timing is only present on words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptToken {
    pub kind: TokenKind,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub text: String,
    pub confidence: Option<f64>,
}

impl TranscriptToken {
    pub fn word(text: impl Into<String>, start: f64, end: f64, confidence: f64) -> Self {
        Self {
            kind: TokenKind::Word,
            start_time: Some(start),
            end_time: Some(end),
            text: text.into(),
            confidence: Some(confidence),
        }
    }

    pub fn punctuation(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Punctuation,
            start_time: None,
            end_time: None,
            text: text.into(),
            confidence: None,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// The provider emits numbers as strings ("0.44"); accept either form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> Result<f64> {
        let parsed = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        };
        // "NaN" and "inf" parse, but cannot be written back as JSON numbers
        parsed.filter(|n| n.is_finite()).ok_or_else(|| {
            CaptionflowError::TransformInvariantViolation(format!(
                "{} is not a finite number: {:?}",
                field, self
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    items: Vec<TranscriptItem>,
}

#[derive(Debug, Deserialize)]
struct TranscriptItem {
    #[serde(rename = "type")]
    item_type: String,
    start_time: Option<Numeric>,
    end_time: Option<Numeric>,
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    content: String,
    confidence: Option<Numeric>,
}

/// Parse the provider transcript document into ordered tokens.
pub fn parse_transcript_document(json: &str) -> Result<Vec<TranscriptToken>> {
    let document: TranscriptDocument = serde_json::from_str(json)?;
    document
        .results
        .items
        .into_iter()
        .enumerate()
        .map(|(position, item)| convert_item(position, item))
        .collect()
}

fn convert_item(position: usize, item: TranscriptItem) -> Result<TranscriptToken> {
    let alternative = item.alternatives.into_iter().next().ok_or_else(|| {
        CaptionflowError::MissingField(format!("results.items[{}].alternatives", position))
    })?;

    let confidence = alternative
        .confidence
        .as_ref()
        .map(|c| c.value("confidence"))
        .transpose()?;

    match item.item_type.as_str() {
        "punctuation" => Ok(TranscriptToken {
            kind: TokenKind::Punctuation,
            start_time: None,
            end_time: None,
            text: alternative.content,
            confidence,
        }),
        "pronunciation" | "word" => {
            let start = item
                .start_time
                .ok_or_else(|| {
                    CaptionflowError::MissingField(format!(
                        "results.items[{}].start_time",
                        position
                    ))
                })?
                .value("start_time")?;
            let end = item
                .end_time
                .ok_or_else(|| {
                    CaptionflowError::MissingField(format!("results.items[{}].end_time", position))
                })?
                .value("end_time")?;

            Ok(TranscriptToken {
                kind: TokenKind::Word,
                start_time: Some(start),
                end_time: Some(end),
                text: alternative.content,
                confidence,
            })
        }
        other => Err(CaptionflowError::TransformInvariantViolation(format!(
            "results.items[{}] has unknown type {:?}",
            position, other
        ))),
    }
}
