use crate::error::{CaptionflowError, Result};
use crate::subtitle::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Srt,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(OutputFormat::Srt),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'srt' or 'json'", s)),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: String,
    /// Role assumed by the media encoder for extraction and packaging jobs.
    pub extract_role_arn: String,
    /// Role assumed by the speech provider for transcription jobs.
    pub transcribe_role_arn: String,
    pub source_language: String,
    pub target_language: String,
    /// Container type of the source media handed to the transcriber.
    pub media_format: String,
    pub default_format: OutputFormat,
    pub captions: SegmenterConfig,
    /// Base URL of the job provider service.
    pub provider_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            extract_role_arn: "arn:aws:iam::012345678901:role/DummyRole".to_string(),
            transcribe_role_arn: "arn:aws:iam::012345678901:role/DummyRole".to_string(),
            source_language: "pt-BR".to_string(),
            target_language: "pt-BR".to_string(),
            media_format: "mp4".to_string(),
            default_format: OutputFormat::default(),
            captions: SegmenterConfig::default(),
            provider_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents)?;
            }
        }

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("REGION") {
            self.region = region;
        }
        if let Some(role) = lookup("MCROLE") {
            self.extract_role_arn = role;
        }
        if let Some(role) = lookup("TCROLE") {
            self.transcribe_role_arn = role;
        }
        if let Some(lang) = lookup("SOURCELANGCODE") {
            self.source_language = lang;
        }
        if let Some(lang) = lookup("TARGETLANGCODE") {
            self.target_language = lang;
        }
        if let Some(media) = lookup("MEDIATYPE") {
            self.media_format = media;
        }
        if let Some(format) = lookup("CAPTIONFLOW_DEFAULT_FORMAT") {
            if let Ok(f) = format.parse() {
                self.default_format = f;
            }
        }
        if let Some(chars) = lookup("CAPTIONFLOW_MAX_CHARS") {
            if let Ok(c) = chars.parse() {
                self.captions.max_chars = c;
            }
        }
        if let Some(words) = lookup("CAPTIONFLOW_MAX_WORDS") {
            if let Ok(w) = words.parse() {
                self.captions.max_words = w;
            }
        }
        if let Some(silence) = lookup("CAPTIONFLOW_MAX_SILENCE") {
            if let Ok(s) = silence.parse() {
                self.captions.max_silence_gap = s;
            }
        }
        if let Some(endpoint) = lookup("CAPTIONFLOW_PROVIDER_ENDPOINT") {
            self.provider_endpoint = Some(endpoint);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.captions.max_chars == 0 {
            return Err(CaptionflowError::Config(
                "max_chars must be greater than 0".to_string(),
            ));
        }
        if self.captions.max_words == 0 {
            return Err(CaptionflowError::Config(
                "max_words must be greater than 0".to_string(),
            ));
        }
        if !self.captions.max_silence_gap.is_finite() || self.captions.max_silence_gap < 0.0 {
            return Err(CaptionflowError::Config(format!(
                "max_silence_gap must be a non-negative number of seconds, got {}",
                self.captions.max_silence_gap
            )));
        }
        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return Err(CaptionflowError::Config(
                "Language codes must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("captionflow").join("config.toml"))
    }
}
