//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Resolve node attributes with data bag overrides applied
#[derive(Parser, Debug)]
#[command(name = "bag-config")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print one attribute as the caller would see it
    ///
    /// Examples:
    ///   bag-config get mysql --node web01.json --data-bags ./data_bags --caller mysql
    ///   bag-config get mysql --node web01.json --caller app --namespace mysql --json
    Get {
        /// Top-level attribute key
        key: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show where overrides for the caller would come from
    Describe {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Inputs shared by every resolving command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ResolveArgs {
    /// Node document (JSON, TOML or YAML)
    #[arg(long)]
    pub node: PathBuf,

    /// Root of the data bag directory tree
    #[arg(long, env = "BAG_CONFIG_DATA_BAGS")]
    pub data_bags: Option<PathBuf>,

    /// Name of the cookbook, recipe or resource reading attributes
    #[arg(long)]
    pub caller: Option<String>,

    /// Namespace to use instead of the caller name
    #[arg(long)]
    pub namespace: Option<String>,

    /// Data bag to read instead of the resolved one
    #[arg(long)]
    pub data_bag: Option<String>,

    /// Namespace allowed to read data bags (repeatable)
    #[arg(long = "allow")]
    pub allow: Vec<String>,

    /// Namespace denied from reading data bags (repeatable)
    #[arg(long = "deny")]
    pub deny: Vec<String>,

    /// Resolver configuration file (TOML)
    #[arg(long, env = "BAG_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Find items by their `id` field instead of by file name
    #[arg(long)]
    pub search: bool,
}
