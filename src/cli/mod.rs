//! CLI module for the relay gateway
//!
//! # Commands
//!
//! - `serve` - Start the gateway server
//! - `classify` - Classify a prompt without dispatching it
//!
//! # Example
//!
//! ```bash
//! # Start the gateway with default config
//! relay serve
//!
//! # Inspect how a prompt would be routed
//! relay classify "Write a function to reverse a linked list"
//! ```

pub mod serve;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Relay - resilient dispatch gateway for LLM inference backends
#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Resilient request-dispatch gateway for LLM inference backends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway server
    Serve(ServeArgs),
    /// Classify a prompt and print the routing intent
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "RELAY_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "RELAY_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RELAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable background health checks
    #[arg(long)]
    pub no_health_check: bool,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Prompt text to classify
    pub text: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handler for the `classify` command.
pub fn handle_classify(args: &ClassifyArgs) -> String {
    let result = crate::classifier::classify(&args.text);
    if args.json {
        serde_json::json!({
            "intent": result.intent,
            "confidence": result.confidence,
        })
        .to_string()
    } else {
        format!(
            "intent: {}  confidence: {:.2}",
            result.intent, result.confidence
        )
    }
}
