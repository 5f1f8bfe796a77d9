pub mod consumer;
pub mod error;
pub mod memory;
pub mod parser;
pub mod sqs;

pub use consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
pub use error::QueueError;
pub use memory::MemoryQueue;
pub use parser::{encode_heartbeat, parse_batch, parse_message, Heartbeat};
pub use sqs::SqsQueue;
