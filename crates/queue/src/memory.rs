//! In-process queue with SQS-like visibility semantics.
//!
//! Polled messages move to an in-flight set until they are acked. Nothing
//! expires here, so an unacked message stays in flight. Used by tests and
//! for running without AWS.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
use crate::error::QueueError;

#[derive(Default)]
struct Inner {
    ready: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
}

#[derive(Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting to be polled.
    pub async fn ready_len(&self) -> usize {
        self.inner.lock().await.ready.len()
    }

    /// Messages polled but not yet acked.
    pub async fn in_flight_len(&self) -> usize {
        self.inner.lock().await.in_flight.len()
    }
}

#[async_trait]
impl QueueConsumer for MemoryQueue {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let mut inner = self.inner.lock().await;
        let take = (max_messages as usize).min(inner.ready.len());
        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(mut msg) = inner.ready.pop_front() {
                msg.attempt_count += 1;
                msg.receipt_handle = Uuid::new_v4().to_string();
                inner.in_flight.insert(msg.receipt_handle.clone(), msg.clone());
                batch.push(msg);
            }
        }
        Ok(batch)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.inner
            .lock()
            .await
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::Ack(format!("unknown receipt handle {receipt_handle}")))
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        Ok(QueueHealth {
            connected: true,
            approximate_message_count: Some(self.ready_len().await as u64),
            provider: "memory".to_string(),
        })
    }
}

#[async_trait]
impl QueueProducer for MemoryQueue {
    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        self.inner.lock().await.ready.push_back(QueueMessage {
            id: id.clone(),
            body: body.to_string(),
            receipt_handle: String::new(),
            timestamp: Utc::now(),
            attempt_count: 0,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poll_respects_batch_size_and_order() {
        let queue = MemoryQueue::new();
        for i in 0..5 {
            queue.send(&format!("m{i}")).await.unwrap();
        }

        let batch = queue.poll_batch(3).await.unwrap();
        let bodies: Vec<_> = batch.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["m0", "m1", "m2"]);
        assert_eq!(queue.ready_len().await, 2);
        assert_eq!(queue.in_flight_len().await, 3);
    }

    #[tokio::test]
    async fn ack_removes_only_that_message() {
        let queue = MemoryQueue::new();
        queue.send("a").await.unwrap();
        queue.send("b").await.unwrap();

        let batch = queue.poll_batch(10).await.unwrap();
        assert_eq!(batch[0].attempt_count, 1);
        queue.ack(&batch[0].receipt_handle).await.unwrap();

        assert_eq!(queue.in_flight_len().await, 1);
        assert!(queue.poll_batch(10).await.unwrap().is_empty());
        queue.ack(&batch[1].receipt_handle).await.unwrap();
        assert_eq!(queue.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn ack_unknown_handle_fails() {
        let queue = MemoryQueue::new();
        assert!(matches!(queue.ack("nope").await, Err(QueueError::Ack(_))));
    }
}
