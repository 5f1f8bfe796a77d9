//! Alert kinds raised by the engine and the sweeper.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Still overdue at sweep time.
    Down,
    /// Heartbeat arrived after at least one Down alert.
    Up,
    /// First overdue heartbeat, no Down alert sent yet.
    Late,
    /// Event is unknown or misconfigured.
    ConfigError,
}

impl NotificationKind {
    /// One-line summary used in subjects and bodies.
    pub fn headline(&self, name: &str) -> String {
        match self {
            Self::Down => format!("Down: {name}"),
            Self::Up => format!("Up: {name}"),
            Self::Late => format!("Late: {name}"),
            Self::ConfigError => format!("Config: {name} has a configuration error"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Late => "late",
            Self::ConfigError => "config_error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headlines() {
        assert_eq!(NotificationKind::Down.headline("db"), "Down: db");
        assert_eq!(NotificationKind::Up.headline("db"), "Up: db");
        assert_eq!(NotificationKind::Late.headline("db"), "Late: db");
        assert_eq!(
            NotificationKind::ConfigError.headline("db"),
            "Config: db has a configuration error"
        );
    }
}
