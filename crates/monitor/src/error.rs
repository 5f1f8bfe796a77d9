use heartwatch_core::ConfigureError;
use heartwatch_notify::NotifyError;
use heartwatch_queue::QueueError;
use heartwatch_storage::StorageError;

/// Errors surfaced by [`Monitor`](crate::Monitor) operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("invalid configuration for '{name}': {source}")]
    Configure {
        name: String,
        #[source]
        source: ConfigureError,
    },
}
