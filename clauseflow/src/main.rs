//! clauseflow - analyze a contract from the command line.
//!
//! Usage: clauseflow analyze <file> [--json] [--config <file>]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clauseflow::config::{ClauseflowConfig, ParsingMode};
use clauseflow::core::Document;
use clauseflow::events::LoggingEventSink;
use clauseflow::pipeline::ContractPipeline;
use clauseflow::providers::ChatCompletionsClient;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clauseflow")]
#[command(about = "Staged LLM analysis of contracts")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the five-stage analysis over a plain-text contract
    Analyze {
        /// Contract text file
        file: PathBuf,
        /// Print the run output as JSON instead of the text report
        #[arg(long)]
        json: bool,
        /// JSON config file
        #[arg(long, env = "CLAUSEFLOW_CONFIG")]
        config: Option<PathBuf>,
        /// Parse the document in overlapping chunks
        #[arg(long)]
        chunked: bool,
    },

    /// Print the effective configuration (the API key is never shown)
    Config {
        /// JSON config file
        #[arg(long, env = "CLAUSEFLOW_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<ClauseflowConfig> {
    ClauseflowConfig::load(path).context("Failed to load configuration")
}

async fn analyze(file: &Path, json: bool, config: Option<&Path>, chunked: bool) -> Result<ExitCode> {
    let config = load_config(config)?;
    let mut pipeline_config = config.pipeline;
    if chunked {
        pipeline_config = pipeline_config.with_parsing_mode(ParsingMode::chunked());
    }

    let document = Document::from_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if document.is_blank() {
        anyhow::bail!("{} contains no text", file.display());
    }

    let client = ChatCompletionsClient::new(config.model).context("Failed to create model client")?;
    let pipeline = ContractPipeline::new(Arc::new(client))
        .with_config(pipeline_config)
        .with_event_sink(Arc::new(LoggingEventSink::default()));

    let run = pipeline.run(Arc::new(document)).await;

    if json {
        println!("{}", run.output().to_json()?);
    } else {
        print!("{}", run.report().render_text());
    }

    if run.is_done() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Analyze {
            file,
            json,
            config,
            chunked,
        } => analyze(&file, json, config.as_deref(), chunked).await,
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
