//! Per-event schedule state.
//!
//! One [`ScheduleRecord`] exists per event name. Every field other than the
//! name is optional in stored data so that a partially configured record can
//! still be loaded and reported as a configuration error instead of failing
//! the whole read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the next deadline is derived from a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Deadlines sit on a fixed grid spaced one period apart.
    Fixed,
    /// The deadline is one period after the latest heartbeat.
    Rolling,
    /// A discipline this build does not understand.
    #[serde(other)]
    Unrecognized,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Rolling => "rolling",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "rolling" => Ok(Self::Rolling),
            other => Err(format!("unknown period type '{other}' (expected fixed or rolling)")),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Stored schedule state for one event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_type: Option<PeriodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Consecutive sweeps that found this event overdue. Keeps counting past
    /// the alert cap; at one increment per period a `u64` never fills up.
    #[serde(default)]
    pub error_count: u64,
    /// Start of the current block (epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_block_time: Option<i64>,
    /// Deadline of the current block (epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_block_time: Option<i64>,
    /// Event time of the most recently accepted heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_time: Option<i64>,
}

impl ScheduleRecord {
    /// An empty, enabled record with nothing configured.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            period_seconds: None,
            period_type: None,
            description: None,
            error_count: 0,
            last_block_time: None,
            next_block_time: None,
            last_success_time: None,
        }
    }

    /// A configured record with no anchor yet.
    pub fn with_schedule(name: impl Into<String>, period_seconds: u64, period_type: PeriodType) -> Self {
        Self {
            period_seconds: Some(period_seconds),
            period_type: Some(period_type),
            ..Self::new(name)
        }
    }

    /// Whether a deadline exists and `event_time` is strictly past it.
    pub fn is_overdue_at(&self, event_time: i64) -> bool {
        self.next_block_time.is_some_and(|next| next < event_time)
    }

    /// Whether `event_time` is older than the last accepted heartbeat.
    pub fn is_stale(&self, event_time: i64) -> bool {
        self.last_success_time.is_some_and(|last| event_time < last)
    }
}
