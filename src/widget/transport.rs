use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::models::relay::{ ErrorBody, RelayRequest, WireMessage };

/// Successful relay reply as the widget reads it. Both fields are optional so
/// a reply without text can fall back to a placeholder instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<WireMessage>>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error! status: {status}{}", detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("Request to relay timed out")]
    Timeout,
    #[error("Failed to reach relay: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Unexpected response from relay: {0}")]
    Decode(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({})", m))
        .unwrap_or_default()
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout } else { TransportError::Network(err) }
    }
}

#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<RelayReply, TransportError>;
}

/// Posts chat requests to a relay over HTTP.
pub struct HttpRelayTransport {
    client: Client,
    url: Url,
}

impl HttpRelayTransport {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn send(&self, request: &RelayRequest) -> Result<RelayReply, TransportError> {
        debug!("POST {} with {} history entries", self.url, request.chat_history.len());

        let resp = self.client
            .post(self.url.clone())
            .header(ACCEPT, "application/json")
            .json(request)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>().await
                .ok()
                .map(|body| body.error);
            return Err(TransportError::Status { status: status.as_u16(), message });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Sender;
    use serde_json::json;
    use wiremock::matchers::{ body_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn transport_for(server: &MockServer, timeout: Duration) -> HttpRelayTransport {
        let url = Url::parse(&format!("{}/chat", server.uri())).unwrap();
        HttpRelayTransport::new(url, timeout).unwrap()
    }

    fn request() -> RelayRequest {
        RelayRequest {
            message: "hi".into(),
            chat_history: vec![WireMessage::new(Sender::User, "before")],
        }
    }

    #[tokio::test]
    async fn posts_json_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({
                "message": "hi",
                "chatHistory": [{"sender": "user", "text": "before"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "hello",
                "chatHistory": []
            })))
            .expect(1)
            .mount(&server).await;

        let reply = transport_for(&server, Duration::from_secs(5)).send(&request()).await.unwrap();
        assert_eq!(reply.response.as_deref(), Some("hello"));
        assert_eq!(reply.chat_history, Some(vec![]));
    }

    #[tokio::test]
    async fn error_status_carries_relay_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(504).set_body_json(json!({
                "error": "Upstream request timed out"
            })))
            .mount(&server).await;

        let err = transport_for(&server, Duration::from_secs(5)).send(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 504 (Upstream request timed out)");
    }

    #[tokio::test]
    async fn error_status_without_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server).await;

        let err = transport_for(&server, Duration::from_secs(5)).send(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn non_json_success_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server).await;

        let err = transport_for(&server, Duration::from_secs(5)).send(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_relay_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late"}))
                    .set_delay(Duration::from_secs(5))
            )
            .mount(&server).await;

        let err = transport_for(&server, Duration::from_millis(50)).send(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }
}
