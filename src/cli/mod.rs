//! CLI module for Coursemate.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Coursemate - Course Materials Assistant
///
/// Ingest course transcripts and ask questions about them. Answers are
/// produced by a language model that searches the course content and
/// outlines through tools.
#[derive(Parser, Debug)]
#[command(name = "coursemate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
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
    /// Ingest a folder of course transcripts (.txt)
    Ingest {
        /// Folder containing course documents
        dir: String,

        /// Remove all indexed courses before ingesting
        #[arg(long)]
        clear: bool,
    },

    /// Ask a question about the indexed courses
    Ask {
        /// The question to ask
        question: String,

        /// Maximum tool-use rounds (0 answers without tools)
        #[arg(short, long)]
        rounds: Option<usize>,

        /// Chat model to use for the answer
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive chat session
    Chat {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed courses
    Courses,

    /// Search course content directly
    Search {
        /// Search query
        query: String,

        /// Course name (partial matches work)
        #[arg(long)]
        course: Option<String>,

        /// Restrict to one lesson number
        #[arg(long)]
        lesson: Option<i64>,
    },

    /// Show a course outline
    Outline {
        /// Course name (partial matches work)
        course: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Course documents folder ingested at startup
        #[arg(long)]
        docs: Option<String>,
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

    /// Show configuration file path
    Path,
}
