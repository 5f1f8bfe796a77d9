use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{ArgGroup, Args, Parser, Subcommand};

use heartwatch_core::{Config, ConfigureRequest, PeriodType};

/// Missing-event monitor.
///
/// Jobs send a heartbeat by name; `poll` records queued heartbeats and
/// alerts on every event whose heartbeat did not arrive in time.
#[derive(Parser, Debug)]
#[command(name = "heartwatch", about = "Missing-event monitor")]
pub struct CliArgs {
    /// SQS queue URL carrying heartbeats
    #[arg(long, global = true)]
    pub queue_url: Option<String>,

    /// Directory holding the record file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Topic alerts are published under
    #[arg(long, global = true)]
    pub topic: Option<String>,

    /// Down alerts per outage before going quiet
    #[arg(long, global = true)]
    pub max_notify_count: Option<u32>,

    /// Queue batches drained per poll
    #[arg(long, global = true)]
    pub poll_count: Option<u32>,

    /// Use the time carried by the heartbeat instead of processing time
    #[arg(long, global = true)]
    pub use_client_time: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enqueue a heartbeat for an event with the current time
    Send { name: String },
    /// Record queued heartbeats, then alert on missed ones
    Poll,
    /// Poll repeatedly until Ctrl-C
    Run,
    /// Create or update an event's schedule
    Config(ConfigArgs),
    /// Print stored events
    Show { name: Option<String> },
    /// Print the version
    Version,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("state").args(["enabled", "disabled"])))]
pub struct ConfigArgs {
    pub name: String,

    /// Expected interval between heartbeats, in seconds
    #[arg(long)]
    pub period: Option<u64>,

    /// How the next deadline is derived: fixed or rolling
    #[arg(long = "type")]
    pub period_type: Option<PeriodType>,

    #[arg(long)]
    pub enabled: bool,

    #[arg(long)]
    pub disabled: bool,

    #[arg(long)]
    pub description: Option<String>,

    /// Day the first heartbeat is expected (YYYY-MM-DD, UTC)
    #[arg(long, value_parser = parse_date)]
    pub initial_date: Option<NaiveDate>,

    /// Time of day the first heartbeat is expected (HH:MM, UTC)
    #[arg(long, value_parser = parse_time)]
    pub initial_time: Option<NaiveTime>,
}

impl ConfigArgs {
    pub fn to_request(&self) -> ConfigureRequest {
        let enabled = match (self.enabled, self.disabled) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ConfigureRequest {
            period_seconds: self.period,
            period_type: self.period_type,
            enabled,
            description: self.description.clone(),
            initial_date: self.initial_date,
            initial_time: self.initial_time,
        }
    }
}

impl CliArgs {
    /// Apply command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.queue_url {
            config.queue.queue_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(topic) = &self.topic {
            config.notify.topic = topic.clone();
        }
        if let Some(count) = self.max_notify_count {
            config.monitor.max_notify_count = count;
        }
        if let Some(count) = self.poll_count {
            config.monitor.poll_count = count;
        }
        if self.use_client_time {
            config.monitor.use_server_time = false;
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}
