pub mod chat;

use crate::config::generation::{ GenerationConfig, HarmBlockThreshold };
use serde::{ Deserialize, Serialize };
use thiserror::Error;

/// Role tag understood by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub generation: GenerationConfig,
    pub safety_threshold: Option<HarmBlockThreshold>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: None,
            base_url: None,
            generation: GenerationConfig::default(),
            safety_threshold: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Gemini API key not configured")]
    MissingApiKey,
    #[error("Upstream request timed out")]
    Timeout,
    #[error("Upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Upstream API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
    },
    #[error("Response blocked by upstream: {0}")]
    Blocked(String),
    #[error("Upstream returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}
