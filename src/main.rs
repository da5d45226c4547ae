use anyhow::{Context, Result};
use captionflow::config::{Config, OutputFormat};
use captionflow::subtitle::{parse_web_captions, SrtFormatter, SubtitleFormatter};
use captionflow::workflow::merge;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "captionflow")]
#[command(version, about = "Caption and workflow tooling for media-processing pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build captions from a speech provider transcript document
    Captions {
        /// Transcript JSON file
        input: PathBuf,

        /// Output file (defaults to input name with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: srt, json (defaults to the configured format)
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Merge parallel branch payloads; later files win on key collisions
    Merge {
        /// Branch payload JSON files, in declaration order
        #[arg(required = true)]
        branches: Vec<PathBuf>,
    },
    /// Render a web-captions file as SRT on stdout
    Render {
        /// Web-captions JSON file
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path, format: &OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!("{}.{}", stem.to_string_lossy(), format.extension()));
    if output == input {
        output.set_file_name(format!(
            "{}.captions.{}",
            stem.to_string_lossy(),
            format.extension()
        ));
    }
    output
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    match cli.command {
        Command::Captions {
            input,
            output,
            format,
        } => {
            let format: OutputFormat = match format {
                Some(f) => f.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => config.default_format,
            };
            let output = output.unwrap_or_else(|| derive_output_path(&input, &format));

            info!("Input:    {}", input.display());
            info!("Output:   {}", output.display());
            info!("Format:   {}", format);

            let result = captionflow::generate_captions(&input, &output, &config, format)
                .await
                .context("Caption generation failed")?;
            captionflow::print_summary(&result);
        }
        Command::Merge { branches } => {
            let mut values = Vec::with_capacity(branches.len());
            for path in &branches {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let value: serde_json::Value = serde_json::from_str(&contents)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                values.push(value);
            }

            let merged = merge(&values).context("Failed to merge branch payloads")?;
            println!("{}", serde_json::to_string_pretty(&merged.into_value())?);
        }
        Command::Render { input } => {
            let contents = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let cues = parse_web_captions(&contents).context("Invalid web captions")?;
            print!("{}", SrtFormatter.format(&cues));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_derive_output_path() {
        let input = PathBuf::from("/path/to/Transcript.json");

        let srt_output = derive_output_path(&input, &OutputFormat::Srt);
        assert_eq!(srt_output, PathBuf::from("/path/to/Transcript.srt"));

        let json_output = derive_output_path(&input, &OutputFormat::Json);
        // Never overwrite the transcript itself
        assert_eq!(json_output, PathBuf::from("/path/to/Transcript.captions.json"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
