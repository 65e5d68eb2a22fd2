use async_trait::async_trait;
use log::{ info, warn };
use reqwest::Client;
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionResponse };
use crate::config::generation::{ safety_settings, GenerationConfig, SafetySetting };
use crate::llm::{ LlmConfig, LlmError, Role, Turn };

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent>,
    generation_config: &'a GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<&'a [SafetySetting]>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: Role,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    prompt_feedback: Option<GooglePromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    content: Option<GoogleContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

fn to_contents(turns: &[Turn]) -> Vec<GeminiContent> {
    turns.iter()
        .map(|turn| GeminiContent {
            role: turn.role,
            parts: vec![GeminiPart { text: turn.text.clone() }],
        })
        .collect()
}

fn extract_text(resp: GoogleResponse) -> Result<String, LlmError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = resp.candidates.into_iter().next().ok_or(LlmError::EmptyResponse)?;
    let text: String = candidate.content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        return match reason.as_str() {
            "SAFETY" | "RECITATION" | "BLOCKLIST" => Err(LlmError::Blocked(reason)),
            _ => Err(LlmError::EmptyResponse),
        };
    }
    Ok(text)
}

pub struct GeminiChatClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Option<String>,
    generation: GenerationConfig,
    safety: Vec<SafetySetting>,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        generation: GenerationConfig,
        safety: Vec<SafetySetting>
    ) -> Self {
        let chat_model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            client: Client::new(),
            api_key,
            model: chat_model,
            base_url: base_url.filter(|u| !u.trim().is_empty()),
            generation,
            safety,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        let safety = config.safety_threshold.map(safety_settings).unwrap_or_default();

        Ok(
            Self::new(
                api_key,
                config.completion_model.clone(),
                config.base_url.clone(),
                config.generation.clone(),
                safety
            )
        )
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/models/{}:generateContent", base.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(&self, turns: &[Turn]) -> Result<CompletionResponse, LlmError> {
        info!(
            "GeminiChatClient::complete() → model={} base_url={:?} turns={}",
            self.model,
            self.base_url,
            turns.len()
        );

        let payload = GenerateContentRequest {
            contents: to_contents(turns),
            generation_config: &self.generation,
            safety_settings: if self.safety.is_empty() { None } else { Some(self.safety.as_slice()) },
        };

        let resp = self.client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json
                ::from_str::<GoogleErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini returned {}: {}", status, message);
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let parsed: GoogleResponse = resp.json().await?;
        let text = extract_text(parsed)?;
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}
