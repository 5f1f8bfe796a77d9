//! HTTP webhook channel.
//!
//! Each alert is POSTed as one JSON object:
//!
//! ```json
//! {"topic": "ops", "event": "backup", "kind": "down",
//!  "subject": "[heartwatch] Down: backup", "body": "..."}
//! ```
//!
//! Any 2xx response counts as delivered.

use std::time::Duration;

use serde::Serialize;

use crate::traits::{Notification, Notifier, NotifyError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire form of an alert.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct AlertPayload<'a> {
    topic: &'a str,
    event: &'a str,
    kind: &'a str,
    subject: &'a str,
    body: &'a str,
}

impl<'a> AlertPayload<'a> {
    fn from_notification(notification: &'a Notification) -> Self {
        Self {
            topic: &notification.topic,
            event: metadata(notification, "event_name"),
            kind: metadata(notification, "kind"),
            subject: &notification.subject,
            body: &notification.body,
        }
    }
}

fn metadata<'a>(notification: &'a Notification, key: &str) -> &'a str {
    notification.metadata.get(key).map(String::as_str).unwrap_or("")
}

#[derive(Debug)]
pub struct WebhookNotifier {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Fails with [`NotifyError::Config`] when `url` is not an http(s) URL.
    pub fn new(url: &str) -> Result<Self, NotifyError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| NotifyError::Config(format!("invalid webhook URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::Config(format!(
                "webhook URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = AlertPayload::from_notification(notification);
        let response = self.client.post(self.url.clone()).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Config(format!("webhook returned {status}: {text}")));
        }

        tracing::debug!(url = %self.url, %status, event = payload.event, "Webhook accepted alert");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartwatch_core::{NotificationKind, PeriodType, ScheduleRecord};

    #[test]
    fn payload_carries_event_and_kind() {
        let mut record = ScheduleRecord::with_schedule("backup", 60, PeriodType::Fixed);
        record.description = Some("nightly".into());
        let mut notification = crate::render(NotificationKind::Down, "backup", Some(&record));
        notification.topic = "ops".into();

        let json = serde_json::to_value(AlertPayload::from_notification(&notification)).unwrap();
        assert_eq!(json["topic"], "ops");
        assert_eq!(json["event"], "backup");
        assert_eq!(json["kind"], "down");
        assert_eq!(json["subject"], "[heartwatch] Down: backup");
        assert!(json["body"].as_str().unwrap().contains("backup: nightly"));
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(WebhookNotifier::new("not a url"), Err(NotifyError::Config(_))));
        assert!(matches!(
            WebhookNotifier::new("ftp://example.com/hook"),
            Err(NotifyError::Config(_))
        ));
        assert!(WebhookNotifier::new("https://example.com/hook").is_ok());
    }
}
