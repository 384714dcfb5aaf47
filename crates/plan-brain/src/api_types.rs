//! Chat completion request and response types.

use plan_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID
    #[serde(default)]
    pub id: Option<String>,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Response choices
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The message
    pub message: ResponseMessage,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Content (may be null)
    pub content: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetails,
}

/// API error details.
///
/// Some gateways send a bare string instead of an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorDetails {
    Detailed {
        message: String,
        #[serde(rename = "type")]
        error_type: Option<String>,
    },
    Message(String),
}

impl ApiErrorDetails {
    pub fn message(&self) -> &str {
        match self {
            ApiErrorDetails::Detailed { message, .. } => message,
            ApiErrorDetails::Message(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_unset_tuning() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: None,
            temperature: Some(0.7),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_first_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{}"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_content(), Some("{}"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.first_content(), None);
    }

    #[test]
    fn test_error_details_shapes() {
        let detailed: ApiError =
            serde_json::from_str(r#"{"error":{"message":"bad key","type":"auth"}}"#).unwrap();
        assert_eq!(detailed.error.message(), "bad key");

        let bare: ApiError = serde_json::from_str(r#"{"error":"quota exceeded"}"#).unwrap();
        assert_eq!(bare.error.message(), "quota exceeded");
    }
}
