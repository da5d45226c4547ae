// Word-level transcript → caption cues
use super::{CaptionCue, WordConfidence};
use crate::transcript::TranscriptToken;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds that close a caption cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Close the cue once its text reaches this many characters (default: 50).
    pub max_chars: usize,
    /// Close the cue once it holds this many words (default: 12).
    pub max_words: usize,
    /// Start a new cue when the silence before a word exceeds this many seconds (default: 1.5).
    pub max_silence_gap: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chars: 50,
            max_words: 12,
            max_silence_gap: 1.5,
        }
    }
}

/// Greedy single-pass segmenter.
#[derive(Debug, Clone, Default)]
pub struct CaptionSegmenter {
    config: SegmenterConfig,
}

/// The cue currently being filled.
struct OpenCue {
    start: f64,
    text: String,
    word_confidences: Vec<WordConfidence>,
    word_count: usize,
}

impl OpenCue {
    fn new(start: f64) -> Self {
        Self {
            start,
            text: String::new(),
            word_confidences: Vec::new(),
            word_count: 0,
        }
    }

    fn finish(self, end: f64) -> CaptionCue {
        CaptionCue {
            start: self.start,
            end: end.max(self.start),
            text: self.text,
            word_confidences: self.word_confidences,
        }
    }
}

impl CaptionSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Convert ordered transcript tokens into non-overlapping cues.
    pub fn segment(&self, tokens: &[TranscriptToken]) -> Vec<CaptionCue> {
        let mut cues: Vec<CaptionCue> = Vec::new();
        let mut open: Option<OpenCue> = None;
        let mut last_word_end = 0.0_f64;

        for token in tokens {
            let is_word = token.is_word();

            let mut cue = match open.take() {
                Some(cue) => cue,
                // A cue never starts with punctuation
                None if !is_word => continue,
                None => OpenCue::new(self.cue_start(token, last_word_end, &cues)),
            };

            if is_word {
                let start = token.start_time.unwrap_or(last_word_end);

                if !cue.text.is_empty() && last_word_end + self.config.max_silence_gap < start {
                    debug!(
                        "Silence of {:.3}s before {:?}, closing cue at {:.3}",
                        start - last_word_end,
                        token.text,
                        start
                    );
                    cues.push(cue.finish(start));
                    cue = OpenCue::new(self.cue_start(token, last_word_end, &cues));
                }

                last_word_end = token.end_time.unwrap_or(start);
            }

            if is_word && !cue.text.is_empty() {
                cue.text.push(' ');
            }
            cue.text.push_str(&token.text);

            if is_word {
                cue.word_confidences.push(WordConfidence {
                    word: token.text.to_lowercase(),
                    confidence: token.confidence,
                });
                cue.word_count += 1;
            }

            if cue.word_count >= self.config.max_words
                || cue.text.chars().count() >= self.config.max_chars
            {
                cues.push(cue.finish(last_word_end));
            } else {
                open = Some(cue);
            }
        }

        if let Some(cue) = open {
            cues.push(cue.finish(last_word_end));
        }

        debug!("Segmented {} tokens into {} cues", tokens.len(), cues.len());
        cues
    }

    /// Start time for a cue opened at `token`, never earlier than the previous cue's end.
    fn cue_start(&self, token: &TranscriptToken, last_word_end: f64, cues: &[CaptionCue]) -> f64 {
        let start = token.start_time.unwrap_or(last_word_end);
        match cues.last() {
            Some(previous) => start.max(previous.end),
            None => start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> TranscriptToken {
        TranscriptToken::word(text, start, end, 0.9)
    }

    fn assert_well_formed(cues: &[CaptionCue]) {
        for cue in cues {
            assert!(cue.end >= cue.start, "cue {:?} ends before it starts", cue);
            let first = cue.text.chars().next().unwrap();
            assert!(first.is_alphanumeric(), "cue starts with {:?}", first);
        }
        for pair in cues.windows(2) {
            assert!(pair[1].start >= pair[0].start);
            assert!(pair[1].start >= pair[0].end);
        }
    }

    #[test]
    fn test_hello_world() {
        let tokens = vec![
            TranscriptToken::word("Hello", 0.0, 0.4, 0.9),
            TranscriptToken::word("world", 0.5, 0.9, 0.95),
            TranscriptToken::punctuation("."),
        ];

        let cues = CaptionSegmenter::default().segment(&tokens);

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start, 0.0);
        assert_eq!(cues[0].end, 0.9);
        assert_eq!(cues[0].text, "Hello world.");
        assert_eq!(
            cues[0].word_confidences,
            vec![
                WordConfidence { word: "hello".into(), confidence: Some(0.9) },
                WordConfidence { word: "world".into(), confidence: Some(0.95) },
            ]
        );
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let segmenter = CaptionSegmenter::default();
        assert!(segmenter.segment(&[]).is_empty());

        let tokens = vec![
            TranscriptToken::punctuation("."),
            TranscriptToken::punctuation(","),
        ];
        assert!(segmenter.segment(&tokens).is_empty());
    }

    #[test]
    fn test_leading_punctuation_dropped() {
        let tokens = vec![
            TranscriptToken::punctuation("?"),
            word("so", 0.2, 0.4),
            TranscriptToken::punctuation(","),
            word("yes", 0.5, 0.7),
        ];

        let cues = CaptionSegmenter::default().segment(&tokens);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "so, yes");
        assert_eq!(cues[0].start, 0.2);
    }

    #[test]
    fn test_max_words_split() {
        let tokens: Vec<TranscriptToken> = (0..13)
            .map(|i| word("a", i as f64 * 0.5, i as f64 * 0.5 + 0.25))
            .collect();

        let cues = CaptionSegmenter::default().segment(&tokens);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].word_confidences.len(), 12);
        assert_eq!(cues[1].word_confidences.len(), 1);
        assert_eq!(cues[0].end, 5.75);
        assert_eq!(cues[1].start, 6.0);
        assert_eq!(cues[1].end, 6.25);
        assert_well_formed(&cues);
    }

    #[test]
    fn test_silence_gap_split() {
        let tokens = vec![
            word("before", 0.0, 0.5),
            TranscriptToken::punctuation("."),
            word("after", 3.0, 3.5),
        ];

        let cues = CaptionSegmenter::default().segment(&tokens);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "before.");
        assert_eq!(cues[0].end, 3.0);
        assert_eq!(cues[1].start, 3.0);
        assert_eq!(cues[1].end, 3.5);
        assert_eq!(cues[1].text, "after");
    }

    #[test]
    fn test_gap_at_threshold_does_not_split() {
        let tokens = vec![word("one", 0.0, 0.5), word("two", 2.0, 2.5)];
        let cues = CaptionSegmenter::default().segment(&tokens);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "one two");
    }

    #[test]
    fn test_max_chars_split() {
        let config = SegmenterConfig {
            max_chars: 10,
            ..SegmenterConfig::default()
        };
        let tokens = vec![
            word("caption", 0.0, 0.5),
            word("text", 0.5, 1.0),
            word("next", 1.0, 1.5),
        ];

        let cues = CaptionSegmenter::new(config).segment(&tokens);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "caption text");
        assert_eq!(cues[0].end, 1.0);
        assert_eq!(cues[1].text, "next");
    }

    #[test]
    fn test_punctuation_after_closed_cue_is_dropped() {
        let config = SegmenterConfig {
            max_words: 2,
            ..SegmenterConfig::default()
        };
        let tokens = vec![
            word("one", 0.0, 0.3),
            word("two", 0.3, 0.6),
            TranscriptToken::punctuation("."),
            word("three", 0.7, 1.0),
        ];

        let cues = CaptionSegmenter::new(config).segment(&tokens);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "one two");
        assert_eq!(cues[1].text, "three");
    }

    #[test]
    fn test_confidence_passed_through() {
        let tokens = vec![TranscriptToken::word("Exact", 0.0, 1.0, 0.123456789)];
        let cues = CaptionSegmenter::default().segment(&tokens);
        assert_eq!(cues[0].word_confidences[0].confidence, Some(0.123456789));
        assert_eq!(cues[0].word_confidences[0].word, "exact");
    }

    #[test]
    fn test_misordered_tokens_keep_invariants() {
        let config = SegmenterConfig {
            max_words: 2,
            ..SegmenterConfig::default()
        };
        let tokens = vec![
            word("late", 4.0, 5.0),
            word("early", 3.0, 3.4),
            word("again", 2.0, 2.5),
        ];

        let cues = CaptionSegmenter::new(config).segment(&tokens);

        assert_eq!(cues.len(), 2);
        assert_well_formed(&cues);
    }
}
