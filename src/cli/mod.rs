//! CLI command definitions and parsing
use crate::config::Config;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gateway-sync",
    version,
    about = "Register AWS API Gateway REST APIs in the Consul catalog",
    long_about = "gateway-sync periodically lists the REST APIs in an AWS region, selects them with \
                  tag filters, renders tag templates for each, and registers every selected API as \
                  an external service in the Consul catalog."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/gateway-sync/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll and register services until interrupted
    Run {
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Run a single sync cycle
    Sync {
        #[command(flatten)]
        sync: SyncArgs,

        /// Print registrations as JSON instead of sending them to Consul
        #[arg(long)]
        dry_run: bool,

        /// Read resources from a JSON file instead of listing them from AWS
        #[arg(long, value_name = "FILE")]
        resources: Option<PathBuf>,
    },

    /// Work with filter expressions
    Filter {
        #[command(subcommand)]
        action: FilterAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags overriding the `[aws]` and `[sync]` configuration sections
#[derive(Args, Debug, Default, Clone)]
pub struct SyncArgs {
    /// The AWS region to search for API gateways
    #[arg(long, value_name = "REGION")]
    pub aws_region: Option<String>,

    /// Inclusion filter, Name=tag:<key>,Values=<regex> (repeatable, all must match)
    #[arg(long = "filter", value_name = "EXPR", action = ArgAction::Append)]
    pub filters: Vec<String>,

    /// Exclusion filter, same syntax (repeatable, any match excludes)
    #[arg(long = "exclude", value_name = "EXPR", action = ArgAction::Append)]
    pub exclusions: Vec<String>,

    /// Tag template added to every registration (repeatable)
    #[arg(long = "tag", value_name = "TEMPLATE", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Seconds to sleep between polls
    #[arg(long, value_name = "SECONDS")]
    pub sleep: Option<u64>,

    /// Consul HTTP address
    #[arg(long, value_name = "URL")]
    pub consul_address: Option<String>,
}

impl SyncArgs {
    /// Apply flags on top of the loaded configuration
    ///
    /// Repeated flags replace the configured list rather than extending it.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(region) = &self.aws_region {
            config.aws.region = region.clone();
        }
        if !self.filters.is_empty() {
            config.sync.filters = self.filters.clone();
        }
        if !self.exclusions.is_empty() {
            config.sync.exclusions = self.exclusions.clone();
        }
        if !self.tags.is_empty() {
            config.sync.tags = self.tags.clone();
        }
        if let Some(secs) = self.sleep {
            config.sync.interval = format!("{}s", secs);
        }
        if let Some(address) = &self.consul_address {
            config.consul.address = address.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum FilterAction {
    /// Parse a filter expression and show its key and pattern
    Check {
        /// Expression in the form Name=tag:<key>,Values=<regex>
        expression: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
