pub mod config;
pub mod configure;
pub mod engine;
pub mod error;
pub mod notification;
pub mod period;
pub mod record;
pub mod sweep;

pub use config::Config;
pub use configure::{apply_configuration, resolve_anchor, ConfigureRequest};
pub use engine::{evaluate_heartbeat, HeartbeatOutcome};
pub use error::*;
pub use notification::NotificationKind;
pub use period::{advance, Block};
pub use record::{PeriodType, ScheduleRecord};
pub use sweep::{evaluate_downtime, DowntimeDecision};
