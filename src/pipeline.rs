use crate::config::{Config, OutputFormat};
use crate::error::{CaptionflowError, Result};
use crate::subtitle::{create_formatter, CaptionCue, CaptionSegmenter};
use crate::transcript::parse_transcript_document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::info;

/// Statistics from a caption generation run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Tokens read from the transcript document.
    pub tokens: usize,
    /// Word tokens among them.
    pub words: usize,
    /// Caption cues produced.
    pub cues: usize,
    /// End of the last cue, in seconds.
    pub captioned_duration: f64,
    pub total_time: Duration,
}

/// Result of the caption generation pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub cues: Vec<CaptionCue>,
    pub stats: PipelineStats,
}

/// Generate a caption file from a speech provider transcript document.
///
/// Runs the same segmentation and rendering as the workflow stages, against
/// local files instead of the object store.
pub async fn generate_captions(
    input: &Path,
    output: &Path,
    config: &Config,
    format: OutputFormat,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    if !input.exists() {
        return Err(CaptionflowError::FileNotFound(input.display().to_string()));
    }

    info!("Reading transcript from {:?}", input);
    let contents = fs::read_to_string(input).await?;
    let tokens = parse_transcript_document(&contents)?;
    let words = tokens.iter().filter(|t| t.is_word()).count();

    let cues = CaptionSegmenter::new(config.captions).segment(&tokens);

    let formatter = create_formatter(format);
    fs::write(output, formatter.format(&cues)).await?;

    info!("Wrote {} cues to {:?}", cues.len(), output);

    let stats = PipelineStats {
        tokens: tokens.len(),
        words,
        cues: cues.len(),
        captioned_duration: cues.last().map(|c| c.end).unwrap_or(0.0),
        total_time: start_time.elapsed(),
    };

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        format,
        cues,
        stats,
    })
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Caption Generation Complete              ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!("  Format:     {}", result.format);
    println!("  Cues:       {}", result.stats.cues);
    println!(
        "  Words:      {} ({} tokens)",
        result.stats.words, result.stats.tokens
    );
    println!("  Duration:   {:.1}s captioned", result.stats.captioned_duration);
    println!(
        "  Total:      {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = r#"{"results": {"items": [
        {"start_time": "0.0", "end_time": "0.4", "type": "pronunciation",
         "alternatives": [{"confidence": "0.9", "content": "Hello"}]},
        {"start_time": "0.5", "end_time": "0.9", "type": "pronunciation",
         "alternatives": [{"confidence": "0.95", "content": "world"}]},
        {"type": "punctuation", "alternatives": [{"confidence": "0.0", "content": "."}]}
    ]}}"#;

    #[tokio::test]
    async fn test_generate_srt() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Transcript.json");
        let output = dir.path().join("captions.srt");
        std::fs::write(&input, TRANSCRIPT).unwrap();

        let result = generate_captions(&input, &output, &Config::default(), OutputFormat::Srt)
            .await
            .unwrap();

        assert_eq!(result.stats.tokens, 3);
        assert_eq!(result.stats.words, 2);
        assert_eq!(result.stats.cues, 1);
        assert_eq!(result.stats.captioned_duration, 0.9);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "1\n00:00:00,000 --> 00:00:00,900\nHello world.\n"
        );
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_captions(
            &dir.path().join("absent.json"),
            &dir.path().join("out.srt"),
            &Config::default(),
            OutputFormat::Srt,
        )
        .await;

        assert!(matches!(result, Err(CaptionflowError::FileNotFound(_))));
    }
}
