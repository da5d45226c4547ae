pub mod config;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod storage;
pub mod subtitle;
pub mod transcript;
pub mod workflow;

pub use config::Config;
pub use error::{CaptionflowError, ErrorKind, Result};
pub use pipeline::{generate_captions, print_summary, PipelineResult, PipelineStats};
