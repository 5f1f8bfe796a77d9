//! Parse queue message JSON bodies into [`Heartbeat`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consumer::QueueMessage;
use crate::error::QueueError;

/// A named liveness signal with its event time (epoch seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub name: String,
    pub time: i64,
}

/// Well-known field names for the event name (tried in order).
const NAME_KEYS: &[&str] = &["name", "Name", "event", "event_name", "eventName"];

/// Well-known field names for the event time.
const TIME_KEYS: &[&str] = &["time", "Time", "timestamp", "Timestamp", "sent_at", "sentAt"];

/// Read a time value: integer/float epoch seconds or an RFC 3339 string.
fn json_to_epoch(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok().map(|dt| dt.timestamp())),
        _ => None,
    }
}

/// Serialize a heartbeat into the queue body format.
pub fn encode_heartbeat(name: &str, time: i64) -> String {
    serde_json::json!({ "name": name, "time": time }).to_string()
}

/// Parse a single queue message body into a [`Heartbeat`].
///
/// - **name**: probes common field names; a missing or empty name is an error
/// - **time**: probes common time fields; falls back to the queue's send time
pub fn parse_message(msg: &QueueMessage) -> Result<Heartbeat, QueueError> {
    let json: Value = serde_json::from_str(&msg.body)
        .map_err(|e| QueueError::Parse(format!("Invalid JSON in message {}: {}", msg.id, e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| QueueError::Parse(format!("Message {} body is not a JSON object", msg.id)))?;

    let name = NAME_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QueueError::Parse(format!("Message {} has no event name", msg.id)))?
        .to_string();

    let time = TIME_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(json_to_epoch))
        .unwrap_or_else(|| msg.timestamp.timestamp());

    Ok(Heartbeat { name, time })
}

/// Parse a batch of messages, separating successes from failures.
///
/// Returns `(heartbeats, errors)` where each heartbeat is paired with the
/// message it came from so the caller can ack it. Order is preserved.
/// Nothing is logged here; the caller decides what a rejected message means.
pub fn parse_batch(messages: &[QueueMessage]) -> (Vec<(&QueueMessage, Heartbeat)>, Vec<(&QueueMessage, QueueError)>) {
    let mut heartbeats = Vec::with_capacity(messages.len());
    let mut errors = Vec::new();

    for msg in messages {
        match parse_message(msg) {
            Ok(hb) => heartbeats.push((msg, hb)),
            Err(e) => errors.push((msg, e)),
        }
    }

    (heartbeats, errors)
}
