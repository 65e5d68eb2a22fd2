use async_trait::async_trait;
use log::debug;
use serde::{ Deserialize, Serialize };
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };

use super::{ HistoryError, HistoryStore };
use crate::models::chat::ChatMessage;

#[derive(Serialize, Deserialize)]
struct StoredHistory {
    #[serde(rename = "chatHistory")]
    chat_history: Vec<ChatMessage>,
}

/// Keeps the history as a single JSON entry in a file on disk.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e.into());
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let stored: StoredHistory = serde_json::from_str(&raw)?;
        debug!("Loaded {} messages from {}", stored.chat_history.len(), self.path.display());
        Ok(stored.chat_history)
    }

    async fn save(&self, history: &[ChatMessage]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let stored = StoredHistory { chat_history: history.to_vec() };
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
