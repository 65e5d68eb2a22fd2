use serde::{ Serialize, Deserialize };

use super::chat::{ ChatMessage, Sender };

/// History entry as carried over the client/relay contract. The sender stays
/// a plain string so the relay can echo back whatever the client sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub sender: String,
    pub text: String,
}

impl WireMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender: sender.as_str().to_string(),
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User.as_str()
    }
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        WireMessage::new(msg.sender, msg.text.clone())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub message: String,
    #[serde(default)]
    pub chat_history: Vec<WireMessage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub response: String,
    pub chat_history: Vec<WireMessage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_history_key() {
        let req = RelayRequest {
            message: "hi".into(),
            chat_history: vec![WireMessage::new(Sender::User, "earlier")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["chatHistory"][0]["sender"], "user");
        assert!(json.get("chat_history").is_none());
    }

    #[test]
    fn request_history_defaults_to_empty() {
        let req: RelayRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.chat_history.is_empty());
    }
}
