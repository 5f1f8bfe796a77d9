//! Publishes alerts to configured channels.
//!
//! Every alert is written to the tracing log first, then stamped with the
//! topic and delivered to each channel in turn. A failing channel does not
//! stop the others, but the dispatch reports it: an alert only counts as
//! delivered when every configured channel took it.

use std::sync::Arc;
use std::time::Instant;

use heartwatch_core::config::NotifyConfig;
use heartwatch_core::{NotificationKind, ScheduleRecord};

use crate::email::EmailNotifier;
use crate::message::render;
use crate::traits::{Notification, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;

/// Delivers alerts for one topic to a set of channels.
pub struct Dispatcher {
    topic: String,
    channels: Vec<Arc<dyn Notifier>>,
}

impl Dispatcher {
    /// Create a dispatcher for `topic` with the given channels. An empty
    /// channel list is valid: alerts then only reach the log.
    pub fn new(topic: impl Into<String>, channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            topic: topic.into(),
            channels,
        }
    }

    /// Build the channel set from config. Webhook and email are added when
    /// configured.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();

        if let Some(url) = &config.webhook_url {
            channels.push(Arc::new(WebhookNotifier::new(url)?));
        }
        if config.email_configured() {
            channels.push(Arc::new(EmailNotifier::from_config(config)?));
        }

        if channels.is_empty() {
            tracing::warn!(topic = %config.topic, "No notification channels configured; alerts go to the log only");
        } else {
            tracing::info!(
                topic = %config.topic,
                channels = ?channels.iter().map(|c| c.channel_name()).collect::<Vec<_>>(),
                "Notification dispatcher ready"
            );
        }

        Ok(Self::new(config.topic.clone(), channels))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Render and publish an alert for `name`.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        name: &str,
        record: Option<&ScheduleRecord>,
    ) -> Result<(), NotifyError> {
        self.dispatch(render(kind, name, record)).await
    }

    /// Publish a rendered notification to all channels.
    ///
    /// Every channel is tried; the first failure does not short-circuit.
    /// Returns [`NotifyError::Undelivered`] naming each channel that failed.
    pub async fn dispatch(&self, mut notification: Notification) -> Result<(), NotifyError> {
        notification.topic = self.topic.clone();
        let event_name = notification.metadata.get("event_name").map(String::as_str).unwrap_or("");

        tracing::warn!(
            topic = %notification.topic,
            event_name = %event_name,
            kind = notification.metadata.get("kind").map(String::as_str).unwrap_or(""),
            subject = %notification.subject,
            "alert"
        );

        let mut errors = Vec::new();
        for channel in &self.channels {
            let start = Instant::now();
            let result = channel.send(&notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => tracing::debug!(
                    event_name = %event_name,
                    channel = channel.channel_name(),
                    duration_ms,
                    "Notification delivered"
                ),
                Err(e) => {
                    tracing::warn!(
                        event_name = %event_name,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    errors.push(format!("{}: {e}", channel.channel_name()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Undelivered {
                failed: errors.len(),
                attempted: self.channels.len(),
                errors: errors.join("; "),
            })
        }
    }
}
