//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// geofence - check whether IP addresses are near an anchor location
#[derive(Parser)]
#[command(name = "geofence")]
#[command(version)]
#[command(about = "Check whether IP addresses are near an anchor location", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: geofence.toml, optional)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check one or more IP addresses against the anchor
    Check {
        /// IP addresses to check
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Resolve and print the anchor location
    Anchor,

    /// Print a sample TOML configuration
    SampleConfig,
}
