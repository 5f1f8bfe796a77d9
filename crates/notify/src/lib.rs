//! Alert delivery for heartwatch.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Webhook and email notifier implementations
//! - Subject/body rendering for each alert kind
//! - Dispatcher that logs every alert and publishes it to each configured channel

pub mod dispatcher;
pub mod email;
pub mod message;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use message::render;
pub use traits::{Notification, Notifier, NotifyError};
