//! CLI command definitions and handlers.

pub mod grade;
pub mod models;

use clap::{Parser, Subcommand};

/// Bubblegrade - Automated bubble sheet grading
#[derive(Parser)]
#[command(name = "bubblegrade")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared grade arguments (paths, key store, thresholds).
    #[command(flatten)]
    pub grade: grade::GradeArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Grade captured sheet photos
    Grade(grade::GradeArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every sheet graded cleanly.
    Success = 0,
    /// At least one sheet could not be graded.
    SheetsFailed = 1,
    /// The run itself failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
