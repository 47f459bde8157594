//! CLI command definitions for the `applymate` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod credentials;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Track job applications by chatting with an assistant.
#[derive(Parser)]
#[command(name = "applymate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (inbound messages, directed sends, chat API).
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind.
        #[arg(long)]
        host: Option<String>,
    },

    /// Send one message through the assistant and print the reply.
    Chat {
        /// Conversation the message belongs to.
        #[arg(long, short, default_value = "cli")]
        user: String,

        /// Message text.
        #[arg(trailing_var_arg = true, required = true)]
        message: Vec<String>,
    },

    /// Show usage of each LLM credential against its limits.
    Credentials,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
