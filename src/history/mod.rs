mod file;
mod memory;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::ChatArgs;
use crate::models::chat::ChatMessage;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("History JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported history store type: {0}")]
    UnsupportedType(String),
}

/// Durable copy of the client's conversation.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the saved history, or an empty one if nothing was saved yet.
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError>;

    async fn save(&self, history: &[ChatMessage]) -> Result<(), HistoryError>;

    async fn clear(&self) -> Result<(), HistoryError>;
}

pub fn create_history_store(args: &ChatArgs) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match args.history_type.to_lowercase().as_str() {
        "file" => {
            info!("Chat history will be stored in: {}", args.history_path);
            Ok(Arc::new(FileHistoryStore::new(&args.history_path)))
        }
        "memory" => {
            info!("Chat history will be kept in memory for this session only");
            Ok(Arc::new(MemoryHistoryStore::default()))
        }
        _ => Err(HistoryError::UnsupportedType(args.history_type.clone())),
    }
}
