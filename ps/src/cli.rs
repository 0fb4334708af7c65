//! CLI argument parsing for progressstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pstore")]
#[command(author, version, about = "Track checklist progress through a step-by-step plan", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog file, overrides the config
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Storage directory, overrides the config
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current step with its examples and checklist
    Show,

    /// List all steps with their checklist progress
    Steps,

    /// Toggle a checklist item
    Toggle {
        /// Item position within the step's checklist
        #[arg(required = true)]
        item: usize,

        /// Step position (default: current step)
        #[arg(short, long)]
        step: Option<usize>,
    },

    /// Jump to a step by position
    Goto {
        /// Step position (0-based)
        #[arg(required = true)]
        position: usize,
    },

    /// Move to the next step
    Next,

    /// Move to the previous step
    Prev,

    /// Show overall progress
    Progress,

    /// Export the plan and its progress as JSON
    Export {
        /// Directory to write `<product>-plan.json` into (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the document to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Forget all saved progress
    Reset,
}
