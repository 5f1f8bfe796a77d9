//! The heartwatch monitor: records heartbeats, sweeps for missed ones and
//! raises alerts.
//!
//! ```text
//! queue ──poll──▶ Monitor::record ──▶ RecordStore
//!                       │
//!                       └──▶ Dispatcher ──▶ log / webhook / email
//! Monitor::sweep ──scan──▶ RecordStore ──▶ Down alerts
//! ```

pub mod error;
pub mod monitor;
pub mod report;

pub use error::MonitorError;
pub use monitor::{send_heartbeat, Monitor, DEFAULT_BATCH_SIZE};
pub use report::{PollReport, Recorded, SweepFailure, SweepReport};
