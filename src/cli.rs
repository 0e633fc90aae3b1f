//! CLI interface for vmcharge
//!
//! This module defines the command-line interface using clap.
//!
//! # Example
//!
//! ```bash
//! # Charge two instances for March 2024
//! vmcharge charge vm-1 vm-2 --month 2024-03
//!
//! # Every exported instance over an explicit window, as JSON
//! vmcharge --json charge --all --since 2024-03-01 --until 2024-03-15T12:00:00Z
//!
//! # Per-interval breakdown in Tokyo time
//! vmcharge --timezone Asia/Tokyo intervals vm-1 --month 2024-03
//! ```

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vmcharge_core::error::{Result, VmchargeError};
use vmcharge_core::timestamp::{month_window, parse_window_bound};

/// Compute billing charges for cloud instances from their action history
#[derive(Parser, Debug, Clone)]
#[command(name = "vmcharge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors in the log output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding exported instance histories
    #[arg(long, global = true, env = "VMCHARGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON file overriding the built-in charge multipliers
    #[arg(long, global = true, env = "VMCHARGE_RATES")]
    pub rates: Option<PathBuf>,

    /// Timezone for displayed times (e.g. "Europe/Berlin", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Display times in UTC (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Billing window selection
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WindowArgs {
    /// Window start (YYYY-MM-DD or timestamp, UTC)
    #[arg(long, requires = "until", conflicts_with = "month")]
    pub since: Option<String>,

    /// Window end, exclusive (YYYY-MM-DD or timestamp, UTC)
    #[arg(long, requires = "since", conflicts_with = "month")]
    pub until: Option<String>,

    /// Bill a whole calendar month (YYYY-MM)
    #[arg(long, short = 'm')]
    pub month: Option<String>,
}

impl WindowArgs {
    /// Resolve the arguments to a `[start, end)` window
    pub fn resolve(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        match (&self.since, &self.until, &self.month) {
            (_, _, Some(month)) => month_window(month),
            (Some(since), Some(until), None) => {
                let start = parse_window_bound(since)?;
                let end = parse_window_bound(until)?;
                if end < start {
                    return Err(VmchargeError::InvalidRange { start, end });
                }
                Ok((start, end))
            }
            _ => Err(VmchargeError::InvalidArgument(
                "Specify a window with --since and --until, or --month".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Charge instances over a billing window
    Charge {
        /// Instances to bill
        #[arg(required_unless_present = "all")]
        instances: Vec<String>,

        /// Bill every instance in the data directory
        #[arg(long, short = 'a', conflicts_with = "instances")]
        all: bool,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Show the per-interval breakdown of one instance
    Intervals {
        /// Instance to inspect
        instance: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Show the effective charge multipliers
    Rates,
}
