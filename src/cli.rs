use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "buildcost", version, about = "Construction material cost estimator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "buildcost.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Estimate cost from a material quantities file
    Estimate {
        /// Path to a JSON array of {material_id, quantity, unit}
        #[arg(short, long)]
        input: PathBuf,

        /// Print the breakdown as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Validate configuration file
    Validate,
}
