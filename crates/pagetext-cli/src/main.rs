//! pagetext command-line interface.
//!
//! # Commands
//!
//! - `extract`: extract the text of one page and print it
//! - `serve`: run the HTTP worker (`/extract`, `/ocr`, `/health`)
//! - `config`: print the resolved configuration as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pagetext::{ExtractionOptions, ExtractionRequest, ExtractionResult, OcrPolicy, PagePipeline, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "pagetext")]
#[command(version)]
#[command(about = "Extract the text of a single document page, with OCR fallback")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of one page
    Extract {
        /// Document URI (http(s)://, file:// or a local path)
        uri: String,

        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Read Tesseract's plain-text output instead of building a searchable PDF
        #[arg(long)]
        no_searchable: bool,

        /// Where OCR runs when the page needs it
        #[arg(long, value_enum)]
        policy: Option<CliPolicy>,

        /// Go straight to OCR without looking at the text layer
        #[arg(long)]
        skip_direct_text: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Configuration file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start the API server
    Serve {
        /// Address to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Configuration file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the resolved configuration
    Config {
        /// Configuration file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPolicy {
    Local,
    Remote,
}

impl From<CliPolicy> for OcrPolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::Local => OcrPolicy::Local,
            CliPolicy::Remote => OcrPolicy::Remote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    PipelineConfig::load(path.map(PathBuf::as_path)).context("Failed to load configuration")
}

/// Configuration for commands that adjust it before building a pipeline. Validation
/// happens when the pipeline is built, after the adjustments.
fn resolve_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    PipelineConfig::resolve(path.map(PathBuf::as_path)).context("Failed to load configuration")
}

fn apply_extract_flags(config: &mut PipelineConfig, policy: Option<CliPolicy>, skip_direct_text: bool) {
    if let Some(policy) = policy {
        config.ocr_policy = policy.into();
    }
    if skip_direct_text {
        config.direct_text = false;
    }
}

fn print_result(result: &ExtractionResult, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text if result.is_success() => println!("{}", result.message),
        OutputFormat::Text => eprintln!("Page {}: {} {}", result.page, result.status, result.message),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            uri,
            page,
            no_searchable,
            policy,
            skip_direct_text,
            output,
            config,
        } => {
            let mut config = resolve_config(config.as_ref())?;
            apply_extract_flags(&mut config, policy, skip_direct_text);

            let pipeline = PagePipeline::new(config).context("Invalid configuration")?;
            let request = ExtractionRequest::new(uri, page).with_options(ExtractionOptions {
                produce_searchable_output: !no_searchable,
            });

            let result = pipeline.run(&request).await?;
            print_result(&result, output)?;

            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Serve { host, port, config } => {
            let config = resolve_config(config.as_ref())?;
            pagetext::api::serve(&host, port, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
