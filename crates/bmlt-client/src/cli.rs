//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// bmlt - talk to a BMLT root server
#[derive(Debug, Parser)]
#[command(name = "bmlt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "BMLT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root server URI (overrides the configuration file)
    #[arg(long, short, env = "BMLT_ROOT_SERVER")]
    pub server: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the connection handshake and show what the server offers
    Connect,

    /// Search meetings with a raw query suffix, e.g. `&weekdays[]=2`
    Search {
        /// Query suffix appended to the search request
        #[arg(allow_hyphen_values = true)]
        query: String,
    },

    /// List change history
    Changes {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only changes to this meeting
        #[arg(long)]
        meeting: Option<i64>,

        /// Only changes in this service body
        #[arg(long)]
        service_body: Option<i64>,
    },

    /// List deleted meetings
    Deleted {
        /// Service body to search (can be repeated)
        #[arg(long, action = clap::ArgAction::Append)]
        service_body: Vec<i64>,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Log in as an administrator and show the granted permissions
    Login {
        /// Admin login name
        #[arg(long, short)]
        user: Option<String>,

        /// Admin password
        #[arg(long, env = "BMLT_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}
