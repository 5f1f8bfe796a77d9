//! Notifier trait definition and shared error types.

use std::collections::HashMap;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed on {failed} of {attempted} channel(s): {errors}")]
    Undelivered {
        failed: usize,
        attempted: usize,
        errors: String,
    },
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    /// Topic the alert is published under.
    pub topic: String,
    /// The rendered subject/title.
    pub subject: String,
    /// The rendered body content.
    pub body: String,
    /// Additional metadata (event name, alert kind).
    pub metadata: HashMap<String, String>,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook", "email").
    fn channel_name(&self) -> &str;
}
