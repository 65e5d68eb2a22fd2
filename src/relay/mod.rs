pub mod error;

use log::{ debug, error, info, warn };
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::llm::chat::ChatClient;
use crate::llm::Turn;
use crate::models::chat::Sender;
use crate::models::relay::{ RelayResponse, WireMessage };
pub use error::RelayError;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// A chat request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub message: String,
    pub chat_history: Vec<WireMessage>,
}

/// Parses a raw POST body into a [`ValidatedRequest`].
///
/// A `chatHistory` that is absent or `null` is treated as an empty history.
pub fn parse_request(body: &[u8]) -> Result<ValidatedRequest, RelayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RelayError::MissingBody);
    }

    let value: Value = serde_json::from_slice(body).map_err(RelayError::InvalidJson)?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or(RelayError::EmptyMessage)?
        .to_string();

    let chat_history = match value.get("chatHistory") {
        None | Some(Value::Null) => Vec::new(),
        Some(history @ Value::Array(_)) =>
            serde_json
                ::from_value::<Vec<WireMessage>>(history.clone())
                .map_err(|_| RelayError::InvalidHistory)?,
        Some(_) => {
            return Err(RelayError::InvalidHistory);
        }
    };

    Ok(ValidatedRequest { message, chat_history })
}

/// Maps client history onto upstream turns and appends the new user turn.
///
/// Anything not sent by the user becomes a model turn. A model turn in first
/// position is the client's greeting and is dropped: upstream conversations
/// must open with a user turn.
pub fn build_upstream_turns(history: &[WireMessage], message: &str) -> Vec<Turn> {
    history
        .iter()
        .enumerate()
        .filter(|(index, msg)| !(*index == 0 && !msg.is_user()))
        .map(|(_, msg)| {
            if msg.is_user() { Turn::user(msg.text.clone()) } else { Turn::model(msg.text.clone()) }
        })
        .chain(std::iter::once(Turn::user(message)))
        .collect()
}

/// Stateless broker between the chat widget and the upstream model.
pub struct Relay {
    chat_client: Option<Arc<dyn ChatClient>>,
    upstream_timeout: Duration,
}

impl Relay {
    pub fn new(chat_client: Option<Arc<dyn ChatClient>>, upstream_timeout: Duration) -> Self {
        Self { chat_client, upstream_timeout }
    }

    pub fn model(&self) -> Option<String> {
        self.chat_client.as_ref().map(|c| c.get_model())
    }

    /// Runs one POST through validation and the upstream call.
    pub async fn process(&self, body: &[u8]) -> Result<RelayResponse, RelayError> {
        let result = self.process_inner(body).await;
        match &result {
            Ok(resp) => info!("Relay answered with {} history entries", resp.chat_history.len()),
            Err(e) if e.status().is_client_error() => warn!("Relay rejected request: {}", e),
            Err(e) => error!("Relay failed: {}", e),
        }
        result
    }

    async fn process_inner(&self, body: &[u8]) -> Result<RelayResponse, RelayError> {
        let client = self.chat_client.as_ref().ok_or(RelayError::MissingCredential)?;
        let request = parse_request(body)?;
        debug!(
            "Validated request: message_len={} history_len={}",
            request.message.len(),
            request.chat_history.len()
        );

        let turns = build_upstream_turns(&request.chat_history, &request.message);
        let completion = match timeout(self.upstream_timeout, client.complete(&turns)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RelayError::UpstreamTimeout);
            }
        };

        let ValidatedRequest { message, mut chat_history } = request;
        chat_history.push(WireMessage::new(Sender::User, message));
        chat_history.push(WireMessage::new(Sender::Ai, completion.response.clone()));

        Ok(RelayResponse {
            response: completion.response,
            chat_history,
        })
    }
}
