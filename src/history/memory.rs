use async_trait::async_trait;
use std::sync::Mutex;

use super::{ HistoryError, HistoryStore };
use crate::models::chat::ChatMessage;

#[derive(Default)]
pub struct MemoryHistoryStore {
    saved: Mutex<Option<Vec<ChatMessage>>>,
}

impl MemoryHistoryStore {
    pub fn with_history(history: Vec<ChatMessage>) -> Self {
        Self { saved: Mutex::new(Some(history)) }
    }

    /// Whether anything is currently persisted.
    pub fn is_saved(&self) -> bool {
        self.saved.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        let saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        Ok(saved.clone().unwrap_or_default())
    }

    async fn save(&self, history: &[ChatMessage]) -> Result<(), HistoryError> {
        let mut saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        *saved = Some(history.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        let mut saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        *saved = None;
        Ok(())
    }
}
