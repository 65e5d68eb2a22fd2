//! UI-independent chat widget.
//!
//! [`ChatWidget`] owns the rendered transcript and mediates between the user,
//! the persisted history and the relay. A UI layer drives it through the
//! `on_*` command handlers and redraws from [`ChatWidget::transcript`] and
//! [`ChatWidget::controls`].

pub mod transport;

use log::{ info, warn };
use std::sync::Arc;
use thiserror::Error;

use crate::format::render_message_html;
use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::{ ChatMessage, Sender };
use crate::models::relay::{ RelayRequest, WireMessage };
pub use transport::{ HttpRelayTransport, RelayReply, RelayTransport, TransportError };

pub const DEFAULT_GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
pub const CLEARED_GREETING: &str = "Chat cleared. How can I help you now?";
pub const LOADING_TEXT: &str = "AI is thinking...";
pub const EMPTY_REPLY_FALLBACK: &str = "I didn't get a response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Message {
        message: ChatMessage,
        delivery: Delivery,
    },
    /// Placeholder shown while a reply is awaited.
    Loading,
    /// Assistant-styled notice for a failed turn.
    Error(String),
}

impl TranscriptEntry {
    fn delivered(message: ChatMessage) -> Self {
        TranscriptEntry::Message { message, delivery: Delivery::Delivered }
    }

    pub fn sender(&self) -> Sender {
        match self {
            TranscriptEntry::Message { message, .. } => message.sender,
            TranscriptEntry::Loading | TranscriptEntry::Error(_) => Sender::Ai,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TranscriptEntry::Message { message, .. } => &message.text,
            TranscriptEntry::Loading => LOADING_TEXT,
            TranscriptEntry::Error(text) => text,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, TranscriptEntry::Message { delivery: Delivery::Delivered, .. })
    }

    pub fn render_html(&self) -> String {
        render_message_html(self.sender(), self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputControls {
    pub input_enabled: bool,
    pub send_enabled: bool,
    pub focus_requested: bool,
}

impl Default for InputControls {
    fn default() -> Self {
        Self {
            input_enabled: true,
            send_enabled: false,
            focus_requested: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Chat history has already been loaded")]
    AlreadyLoaded,
    #[error("A message is already being sent")]
    Busy,
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// A send that has been shown optimistically and awaits the relay.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub request: RelayRequest,
    user_index: usize,
}

pub struct ChatWidget {
    store: Arc<dyn HistoryStore>,
    transport: Arc<dyn RelayTransport>,
    transcript: Vec<TranscriptEntry>,
    controls: InputControls,
    loaded: bool,
}

impl ChatWidget {
    pub fn new(store: Arc<dyn HistoryStore>, transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            store,
            transport,
            transcript: Vec::new(),
            controls: InputControls::default(),
            loaded: false,
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn controls(&self) -> InputControls {
        self.controls
    }

    pub fn is_busy(&self) -> bool {
        self.transcript.iter().any(|e| matches!(e, TranscriptEntry::Loading))
    }

    /// Fills the transcript from the store, seeding the greeting when nothing
    /// was saved. An unreadable store is treated as empty.
    pub async fn load_history(&mut self) -> Result<(), WidgetError> {
        if self.loaded {
            return Err(WidgetError::AlreadyLoaded);
        }
        self.loaded = true;

        let saved = match self.store.load().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Could not read saved chat history, starting fresh: {}", e);
                Vec::new()
            }
        };

        if saved.is_empty() {
            self.transcript.push(TranscriptEntry::delivered(ChatMessage::ai(DEFAULT_GREETING)));
        } else {
            info!("Restored {} messages from saved history", saved.len());
            self.transcript.extend(saved.into_iter().map(TranscriptEntry::delivered));
        }
        Ok(())
    }

    pub fn on_input_change(&mut self, text: &str) {
        self.controls.send_enabled = self.controls.input_enabled && !text.trim().is_empty();
    }

    /// Full send: optimistic display, relay call, then reconciliation.
    pub async fn on_send(&mut self, text: &str) -> Result<(), WidgetError> {
        self.submit_message(text).await
    }

    pub async fn on_clear<F: FnOnce() -> bool>(&mut self, confirm: F) -> Result<bool, WidgetError> {
        self.clear_history(confirm).await
    }

    pub async fn submit_message(&mut self, text: &str) -> Result<(), WidgetError> {
        let Some(pending) = self.begin_send(text)? else {
            return Ok(());
        };
        let outcome = self.dispatch(&pending).await;
        self.finish_send(pending, outcome).await;
        Ok(())
    }

    /// Sends a pending turn to the relay without touching the transcript.
    pub async fn dispatch(&self, pending: &PendingTurn) -> Result<RelayReply, TransportError> {
        self.transport.send(&pending.request).await
    }

    /// Shows the user's message and the loading placeholder and locks the
    /// input. Returns `None` for blank input.
    pub fn begin_send(&mut self, text: &str) -> Result<Option<PendingTurn>, WidgetError> {
        if self.is_busy() {
            return Err(WidgetError::Busy);
        }
        let message = text.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let chat_history = self.outgoing_history();

        let user_index = self.transcript.len();
        self.transcript.push(TranscriptEntry::Message {
            message: ChatMessage::user(message),
            delivery: Delivery::Pending,
        });
        self.transcript.push(TranscriptEntry::Loading);
        self.controls = InputControls {
            input_enabled: false,
            send_enabled: false,
            focus_requested: false,
        };

        Ok(
            Some(PendingTurn {
                request: RelayRequest {
                    message: message.to_string(),
                    chat_history,
                },
                user_index,
            })
        )
    }

    /// Reconciles the transcript with the relay outcome. Only a successful
    /// turn is persisted; the controls are unlocked either way.
    pub async fn finish_send(
        &mut self,
        pending: PendingTurn,
        outcome: Result<RelayReply, TransportError>
    ) {
        self.transcript.retain(|e| !matches!(e, TranscriptEntry::Loading));

        let succeeded = outcome.is_ok();
        let user_entry = self.transcript.get_mut(pending.user_index);
        if let Some(TranscriptEntry::Message { delivery, .. }) = user_entry {
            *delivery = if succeeded { Delivery::Delivered } else { Delivery::Failed };
        }

        match outcome {
            Ok(reply) => {
                let text = reply.response
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());
                self.transcript.push(TranscriptEntry::delivered(ChatMessage::ai(text)));
                self.persist().await;
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                self.transcript.push(TranscriptEntry::Error(format!("Error: {}", e)));
            }
        }

        self.controls = InputControls {
            input_enabled: true,
            send_enabled: false,
            focus_requested: true,
        };
    }

    /// Empties the transcript and the store after confirmation, then shows a
    /// fresh greeting. Returns whether anything was cleared.
    pub async fn clear_history<F: FnOnce() -> bool>(
        &mut self,
        confirm: F
    ) -> Result<bool, WidgetError> {
        if self.transcript.is_empty() {
            return Ok(false);
        }
        if self.is_busy() {
            return Err(WidgetError::Busy);
        }
        if !confirm() {
            return Ok(false);
        }

        // the transcript stays intact if the durable copy cannot be removed
        self.store.clear().await?;
        self.transcript.clear();
        self.transcript.push(TranscriptEntry::delivered(ChatMessage::ai(CLEARED_GREETING)));
        info!("Chat history cleared");
        Ok(true)
    }

    /// History sent with the next request: delivered messages only, without
    /// an assistant greeting in first position.
    pub fn outgoing_history(&self) -> Vec<WireMessage> {
        self.transcript
            .iter()
            .enumerate()
            .filter(|(index, entry)| !(*index == 0 && entry.sender() == Sender::Ai))
            .filter(|(_, entry)| entry.is_delivered())
            .map(|(_, entry)| WireMessage::new(entry.sender(), entry.text()))
            .collect()
    }

    /// What the store should hold: every delivered message, greeting included.
    pub fn persisted_history(&self) -> Vec<ChatMessage> {
        self.transcript
            .iter()
            .filter_map(|entry| match entry {
                TranscriptEntry::Message { message, delivery: Delivery::Delivered } =>
                    Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.persisted_history()).await {
            warn!("Failed to save chat history: {}", e);
        }
    }
}
