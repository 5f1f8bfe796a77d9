//! Outcomes of monitor operations, returned for logging and tests.

use heartwatch_core::NotificationKind;

/// What [`Monitor::record`](crate::Monitor::record) did with a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// Record advanced; `notification` is the alert that went out, if any.
    Accepted { notification: Option<NotificationKind> },
    /// Older than the last accepted heartbeat; nothing changed.
    Stale,
    /// Unknown, misconfigured or unreadable record; a config alert was sent.
    ConfigError,
}

/// A record the sweep could not write or alert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub name: String,
    pub error: String,
}

impl SweepFailure {
    pub(crate) fn new(name: &str, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records examined.
    pub checked: usize,
    /// Down alerts delivered.
    pub notified: usize,
    /// Overdue records past their alert budget.
    pub suppressed: usize,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Messages pulled off the queue.
    pub received: usize,
    pub recorded: usize,
    pub stale: usize,
    pub config_errors: usize,
    /// Messages that were not valid heartbeats.
    pub rejected: usize,
    /// Heartbeats recorded whose alert could not be delivered.
    pub dispatch_failures: usize,
    pub sweep: SweepReport,
}
