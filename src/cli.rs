//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// mailshot - bulk email campaign dispatcher
#[derive(Parser)]
#[command(name = "mailshot")]
#[command(version)]
#[command(about = "Bulk email campaign dispatcher with click tracking", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server together with the job workers (default)
    Serve,

    /// Run job workers only
    Worker {
        /// Number of workers (default: dispatch.workers)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Start sending a draft or scheduled campaign
    Send {
        campaign_id: String,
    },

    /// Pause a campaign
    Pause {
        campaign_id: String,
    },

    /// Resume a paused campaign
    Resume {
        campaign_id: String,
    },

    /// Show campaign progress
    Status {
        campaign_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count the distinct recipients a send would reach
    Estimate {
        campaign_id: String,
    },

    /// Run database migrations and exit
    Migrate,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// No subcommand means `serve`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
