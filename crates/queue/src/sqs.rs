//! AWS SQS heartbeat queue.
//!
//! Heartbeats are plain SQS messages. Receives long-poll for up to
//! [`LONG_POLL_SECS`]; a heartbeat that is not acked reappears after the
//! configured visibility timeout.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_sqs::config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName, QueueAttributeName};
use aws_sdk_sqs::Client;
use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};

use heartwatch_core::config::{AwsConfig, QueueConfig};

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
use crate::error::QueueError;

/// SQS caps receive calls at 10 messages.
const SQS_MAX_BATCH: u32 = 10;
const LONG_POLL_SECS: i32 = 20;

/// Both ends of the heartbeat queue on SQS.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    visibility_timeout_secs: i32,
}

impl SqsQueue {
    pub async fn new(aws: &AwsConfig, queue: &QueueConfig) -> Result<Self, QueueError> {
        if queue.queue_url.is_empty() {
            return Err(QueueError::NotConfigured("HEARTWATCH_QUEUE_URL is not set".into()));
        }

        // QUEUE_AWS_ENDPOINT_URL only; the generic AWS_ENDPOINT_URL may point
        // at another service.
        let mut builder = aws_sdk_sqs::Config::builder()
            .region(Region::new(aws.region.clone()))
            .behavior_version(BehaviorVersion::latest());

        if let (Some(key_id), Some(secret)) = (&aws.access_key_id, &aws.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(
                key_id,
                secret,
                aws.session_token.clone(),
                None,
                "heartwatch-static",
            ));
        }
        if let Some(url) = endpoint_override(aws.endpoint_url.as_deref()) {
            builder = builder.endpoint_url(url);
        }

        info!(queue_url = %queue.queue_url, region = %aws.region, "SQS heartbeat queue ready");

        Ok(Self {
            client: Client::from_conf(builder.build()),
            queue_url: queue.queue_url.clone(),
            visibility_timeout_secs: i32::try_from(queue.visibility_timeout_secs).unwrap_or(i32::MAX),
        })
    }
}

/// Endpoint override with a scheme; blank means none.
fn endpoint_override(endpoint: Option<&str>) -> Option<String> {
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty())?;
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Some(endpoint.to_string())
    } else {
        Some(format!("https://{endpoint}"))
    }
}

/// Convert a received SQS message. Messages without a receipt handle cannot
/// be acked and are skipped.
fn to_queue_message(msg: &Message) -> Option<QueueMessage> {
    let receipt_handle = msg.receipt_handle()?.to_string();
    let attribute = |name: MessageSystemAttributeName| {
        msg.attributes()
            .and_then(|attrs| attrs.get(&name))
            .map(String::as_str)
    };

    // SentTimestamp is epoch millis.
    let timestamp = attribute(MessageSystemAttributeName::SentTimestamp)
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now);
    let attempt_count = attribute(MessageSystemAttributeName::ApproximateReceiveCount)
        .and_then(|c| c.parse().ok())
        .unwrap_or(1);

    Some(QueueMessage {
        id: msg.message_id().unwrap_or_default().to_string(),
        body: msg.body().unwrap_or_default().to_string(),
        receipt_handle,
        timestamp,
        attempt_count,
    })
}

#[async_trait]
impl QueueConsumer for SqsQueue {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let batch = max_messages.clamp(1, SQS_MAX_BATCH) as i32;

        let resp = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(batch)
            .wait_time_seconds(LONG_POLL_SECS)
            .visibility_timeout(self.visibility_timeout_secs)
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("receive from {}: {}", self.queue_url, DisplayErrorContext(&e))))?;

        let received = resp.messages();
        let messages: Vec<QueueMessage> = received.iter().filter_map(to_queue_message).collect();
        if messages.len() < received.len() {
            warn!(skipped = received.len() - messages.len(), "SQS returned messages without a receipt handle");
        }
        debug!(count = messages.len(), "Heartbeats received");
        Ok(messages)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Ack(format!("delete from {}: {}", self.queue_url, DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("attributes of {}: {}", self.queue_url, DisplayErrorContext(&e))))?;

        Ok(QueueHealth {
            connected: true,
            approximate_message_count: resp
                .attributes()
                .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
                .and_then(|v| v.parse().ok()),
            provider: "sqs".to_string(),
        })
    }
}

#[async_trait]
impl QueueProducer for SqsQueue {
    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let resp = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Send(format!("send to {}: {}", self.queue_url, DisplayErrorContext(&e))))?;
        Ok(resp.message_id().unwrap_or_default().to_string())
    }
}
