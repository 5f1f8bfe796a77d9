//! Subject and body text for each alert kind.

use std::collections::HashMap;

use heartwatch_core::{NotificationKind, ScheduleRecord};

use crate::traits::Notification;

const PRODUCT: &str = "heartwatch";

/// Render the alert for `name`. The record, when given, contributes its
/// description to the body. The topic is filled in by the dispatcher.
pub fn render(kind: NotificationKind, name: &str, record: Option<&ScheduleRecord>) -> Notification {
    let headline = kind.headline(name);
    let subject = format!("[{PRODUCT}] {headline}");

    let title = format!("{PRODUCT} alert");
    let mut body = format!("{title}\n{}\n\n{headline}", "-".repeat(title.len()));
    if let Some(description) = record.and_then(|r| r.description.as_deref()) {
        body.push_str(&format!("\n{name}: {description}"));
    }
    body.push_str(&format!("\n\n--\n{PRODUCT}"));

    Notification {
        topic: String::new(),
        subject,
        body,
        metadata: HashMap::from([
            ("event_name".to_string(), name.to_string()),
            ("kind".to_string(), kind.to_string()),
        ]),
    }
}
