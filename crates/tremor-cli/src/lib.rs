//! tremor-baseline command-line tool
//!
//! Offline workflow around the baseline model:
//!
//! ```bash
//! # Fit a personal baseline from a recorded session
//! tremor-baseline train --session gameplay_session.csv --model baseline_model.bin
//!
//! # Check a later session window by window
//! tremor-baseline check --session today.csv --model baseline_model.bin
//!
//! # Pick eps from the k-distance curve, then inspect the clustering
//! tremor-baseline k-distance --session gameplay_session.csv
//! tremor-baseline --eps 1.2 analyze --session gameplay_session.csv
//! ```
//!
//! Every command prints a JSON report on stdout; logs go to stderr.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod commands;
pub mod settings;

pub use settings::{Settings, SettingsError};

/// Movement baseline command-line interface
#[derive(Parser, Debug)]
#[command(name = "tremor-baseline")]
#[command(author, version, about = "Personal movement baseline and tremor anomaly checks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (TOML, JSON or YAML), layered under TREMOR_* variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Command-line overrides, applied on top of file and environment settings
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct TuningArgs {
    /// Neighbourhood radius in standardized feature space
    #[arg(long, global = true)]
    pub eps: Option<f64>,

    /// Density threshold (default: 2 x number of features)
    #[arg(long, global = true)]
    pub min_samples: Option<usize>,

    /// Sensor sample rate in Hz
    #[arg(long, global = true)]
    pub sample_rate: Option<f64>,

    /// Analysis window length in seconds
    #[arg(long, global = true)]
    pub window_size: Option<f64>,

    /// Fraction of overlap between consecutive windows
    #[arg(long, global = true)]
    pub overlap: Option<f64>,

    /// Keep only the largest cluster as the normal region
    #[arg(long, global = true)]
    pub largest_cluster: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Fit a baseline model from a recorded session and save it
    Train {
        /// Session CSV (default: settings.session_path)
        #[arg(short, long)]
        session: Option<PathBuf>,
        /// Output model file (default: settings.model_path)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Check every window of a session against a saved model
    Check {
        #[arg(short, long)]
        session: Option<PathBuf>,
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Print the sorted k-distance curve of a session
    KDistance {
        #[arg(short, long)]
        session: Option<PathBuf>,
        /// Neighbour rank (default: the derived min_samples)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Cluster a session and project it to 2-D
    Analyze {
        #[arg(short, long)]
        session: Option<PathBuf>,
    },
}

/// Filter directive for the given verbosity flags
pub fn log_directive(verbose: u8, quiet: bool) -> Option<&'static str> {
    match (quiet, verbose) {
        (true, _) => Some("warn"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    }
}

/// Install the global subscriber on stderr. Explicit flags win over RUST_LOG.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = match log_directive(verbose, quiet) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
