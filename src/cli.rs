//! Command-line argument parsing for druidctl.

use crate::broker::QueryParameter;
use crate::config::Config;
use crate::ingest::PollConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Submit Druid ingestion tasks and query the broker.
#[derive(Parser, Debug)]
#[command(name = "druidctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "DRUID_CLIENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overlord connection name (overrides config)
    #[arg(long, value_name = "NAME")]
    pub ingest_connection: Option<String>,

    /// Broker connection name (overrides config)
    #[arg(long, value_name = "NAME")]
    pub broker_connection: Option<String>,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit an ingestion spec and wait for the task to finish
    Submit {
        /// Path to the JSON task spec
        #[arg(value_name = "SPEC")]
        spec: PathBuf,

        /// Seconds between status polls
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Poll budget before the task is shut down (0 = unbounded)
        #[arg(long, value_name = "N")]
        max_ingestion_secs: Option<u64>,
    },

    /// Print the current status of a task
    Status {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },

    /// Shut down a running task
    Shutdown {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },

    /// Run a SQL query against the broker
    Query {
        #[arg(value_name = "SQL")]
        sql: String,

        /// Positional parameter as TYPE:VALUE (e.g. BIGINT:10); repeatable
        #[arg(short = 'p', long = "param", value_name = "PARAM")]
        params: Vec<String>,

        /// Print only the first row
        #[arg(long)]
        first: bool,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies connection-name overrides to the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(name) = &self.ingest_connection {
            config.client.ingest_connection = name.clone();
        }
        if let Some(name) = &self.broker_connection {
            config.client.broker_connection = name.clone();
        }
    }
}

/// Builds the poll config for `submit`, letting flags override the file.
pub fn poll_config(config: &Config, interval: Option<u64>, max_secs: Option<u64>) -> PollConfig {
    let mut poll = PollConfig::from(&config.client);
    if let Some(secs) = interval {
        poll = poll.with_interval(Duration::from_secs(secs));
    }
    if let Some(max) = max_secs {
        poll = poll.with_max_ingestion_secs(max);
    }
    poll
}

/// Parses `--param` values in order.
pub fn parse_params(raw: &[String]) -> Vec<QueryParameter> {
    raw.iter().map(|p| QueryParameter::parse(p)).collect()
}
