pub mod backend;
pub mod error;

use std::sync::Arc;

use tracing::info;

pub use backend::{FileStore, MemoryStore, RecordStore};
pub use error::StorageError;

/// Open the record store selected by config (`file` or `memory`).
pub fn open_store(config: &heartwatch_core::config::StorageConfig) -> Result<Arc<dyn RecordStore>, StorageError> {
    match config.backend.as_str() {
        "file" => Ok(Arc::new(FileStore::new(&config.data_dir)?)),
        "memory" => {
            info!("Using in-memory record store; records are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(StorageError::NotConfigured(format!(
            "unknown store backend '{other}' (expected file or memory)"
        ))),
    }
}
