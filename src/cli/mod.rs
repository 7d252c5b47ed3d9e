//! Command-line interface for redact-gateway.
//!
//! Provides commands for serving the gateway, running the pipeline once
//! from a file or stdin, and inspecting configuration.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig, CONFIG_PATH_ENV};
use crate::core::Orchestrator;
use crate::domain::{PipelineRequest, DEFAULT_ENTITIES};
use crate::server::{self, AppState};

/// redact-gateway - analyze, anonymize, then ask an LLM about a log
#[derive(Parser, Debug)]
#[command(name = "redact-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: .redact-gateway/config.yaml in this or a parent directory)
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run the pipeline once and print the JSON outcome
    Run {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Entity types to detect (comma-separated; default catalog if omitted)
        #[arg(short, long, value_delimiter = ',')]
        entities: Option<Vec<String>>,

        /// Language of the input text
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show resolved configuration (API key masked)
    Config,

    /// List the default entity catalog
    Entities,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { bind } => serve(self.config, bind).await,
            Commands::Run {
                input,
                entities,
                language,
            } => run_once(self.config, input, entities, language).await,
            Commands::Config => show_config(self.config),
            Commands::Entities => {
                for entity in DEFAULT_ENTITIES {
                    println!("{}", entity);
                }
                Ok(())
            }
        }
    }
}

fn load(path: Option<PathBuf>) -> Result<ResolvedConfig> {
    config::load_config(path.as_deref()).context("Failed to load configuration")
}

/// Start the HTTP gateway
async fn serve(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = load(config_path)?;
    let address = bind.unwrap_or_else(|| config.bind.clone());

    let state = AppState::new(Orchestrator::new(config.pipeline));
    server::bind_and_serve(&address, state).await
}

/// Run the pipeline once with the given input
async fn run_once(
    config_path: Option<PathBuf>,
    input_file: Option<PathBuf>,
    entities: Option<Vec<String>>,
    language: Option<String>,
) -> Result<()> {
    let config = load(config_path)?;

    // Get input
    let text = if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    };

    let request = PipelineRequest::from_parts(
        Some(text),
        entities,
        language,
        &config.pipeline.default_language,
    );

    let orchestrator = Orchestrator::new(config.pipeline);
    let outcome = orchestrator.run(&request).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );

    if let Some(error) = outcome.error() {
        anyhow::bail!("Pipeline failed at stage '{}': {}", error.stage, error.details);
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path)?;
    let pipeline = &config.pipeline;

    println!("redact-gateway configuration");
    println!("============================");
    println!();

    if let Some(ref path) = config.config_file {
        println!("Config file:     {}", path.display());
    } else {
        println!("Config file:     (none - using environment)");
    }
    println!("Bind:            {}", config.bind);
    println!();

    println!("Analyzer URL:    {}", pipeline.analyzer_url);
    println!("Anonymizer URL:  {}", pipeline.anonymizer_url);
    println!("LLM endpoint:    {}", pipeline.llm.completions_url());
    println!("LLM model:       {}", pipeline.llm.model);
    println!(
        "LLM API key:     {}",
        if pipeline.llm.api_key.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("Max tokens:      {}", pipeline.llm.max_tokens);
    println!();

    println!("Timeouts:");
    println!("  analyze:       {:?}", pipeline.timeouts.analyze);
    println!("  anonymize:     {:?}", pipeline.timeouts.anonymize);
    println!("  llm_analyze:   {:?}", pipeline.timeouts.llm_analyze);
    println!();

    println!("Redaction:       {}", pipeline.operator.name());
    if let Some(token) = pipeline.operator.replacement() {
        println!("  new_value:     {:?}", token);
    }
    println!("Language:        {}", pipeline.default_language);

    Ok(())
}
