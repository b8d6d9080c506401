//! CLI module for Kurs.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kurs - Course Catalog and Assistant
///
/// A course catalog server with a retrieval-augmented chat assistant.
/// The name "Kurs" comes from the Norwegian/German word for "course."
#[derive(Parser, Debug)]
#[command(name = "kurs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "KURS_PORT", default_value = "3000")]
        port: u16,
    },

    /// Start an interactive chat session
    Chat,

    /// Search the course corpus for relevant passages
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// List the course catalog
    Courses {
        /// Only show free courses
        #[arg(long)]
        free: bool,

        /// Only show paid courses
        #[arg(long)]
        paid: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
