//! Command-line interface definition using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Handover - cover absent workers' tasks and give them back on return
#[derive(Parser, Debug)]
#[command(name = "handover")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON fixture holding ownership, absences and substitutes
    #[arg(
        short,
        long,
        env = "HANDOVER_FIXTURE",
        default_value = "handover.json",
        global = true
    )]
    pub fixture: PathBuf,

    /// Write updated ownership and notifications back to the fixture
    #[arg(long, global = true)]
    pub save: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reallocate an absent worker's tasks to substitutes
    Reallocate {
        /// Absent worker id
        #[arg(short, long)]
        worker: u64,
    },

    /// Return reallocated tasks to their original owner
    Return {
        /// Returning worker id
        #[arg(short, long)]
        worker: u64,
    },

    /// Reallocate for every worker absent on a date
    SweepAbsences {
        /// Date to sweep (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Return tasks to every worker back after an absence
    SweepReturns {
        /// Date to sweep (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show a worker's unexpired notifications
    Inbox {
        /// Recipient worker id
        #[arg(short, long)]
        worker: u64,
    },
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
