//! CLI module for Plotwise
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `generate` - Run questions through the pipeline once
//! - `classify` - Classify a single question
//! - `guidance` - Show composer guidance for a domain and diagram type
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! plotwise serve
//!
//! # Draw one figure and print the result as JSON
//! plotwise generate --question "Find R_total for R1=10Ω and R2=20Ω in series" --json
//!
//! # Generate shell completions
//! plotwise completions bash > ~/.bash_completion.d/plotwise
//! ```

pub mod classify;
pub mod completions;
pub mod config;
pub mod generate;
pub mod guidance;
pub mod output;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use guidance::handle_guidance;

use crate::question::EnginePreference;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Plotwise - diagram generation with automated visual review
#[derive(Parser, Debug)]
#[command(
    name = "plotwise",
    version,
    about = "Routed diagram generation with automated visual review"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Generate diagrams for questions
    Generate(GenerateArgs),
    /// Classify a question
    Classify(ClassifyArgs),
    /// Show guidance for a domain and diagram type
    Guidance(GuidanceArgs),
    /// Manage plotwise.toml
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "plotwise.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "PLOTWISE_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "PLOTWISE_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PLOTWISE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "plotwise.toml")]
    pub config: PathBuf,

    /// Question text
    #[arg(short, long, conflicts_with = "input", required_unless_present = "input")]
    pub question: Option<String>,

    /// JSON file with an array of question records
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Subject hint passed to the classifier
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Engine preference (auto, prefer_code, prefer_generative)
    #[arg(short, long, default_value = "auto")]
    pub engine: EnginePreference,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level for progress output on stderr
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Question text
    pub text: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "plotwise.toml")]
    pub config: PathBuf,

    /// Subject hint passed to the classifier
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GuidanceArgs {
    /// Domain (e.g. electrical, mechanical)
    pub domain: String,

    /// Diagram type (e.g. circuit_schematic, free_body_diagram)
    pub diagram_type: String,

    /// Mark the diagram type as unsuitable for image generation
    #[arg(long)]
    pub code_only: bool,

    /// Engine preference used for the engine order
    #[arg(short, long, default_value = "auto")]
    pub engine: EnginePreference,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter plotwise.toml (one OpenAI endpoint, Graphviz schematics)
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the config
    #[arg(short, long, default_value = "plotwise.toml")]
    pub output: PathBuf,

    /// Replace an existing config file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
