pub mod gemini;

use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use super::{ LlmConfig, LlmError, Turn };
use self::gemini::GeminiChatClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Generates the next model turn for a role-tagged conversation whose last
    /// entry is the user turn being answered.
    async fn complete(&self, turns: &[Turn]) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

/// Builds the upstream client, or `None` when no API key is configured so the
/// relay can still start and answer every chat request with a credential error.
pub fn optional_client(config: &LlmConfig) -> Result<Option<Arc<dyn ChatClient>>, LlmError> {
    match new_client(config) {
        Ok(client) => Ok(Some(client)),
        Err(LlmError::MissingApiKey) => {
            warn!("No Gemini API key configured. Chat requests will be rejected.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
