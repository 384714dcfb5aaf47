//! Chat-completion seam for AI providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A backend that turns a list of chat messages into raw completion text.
///
/// Implementations must report transport failures as [`AiError::Network`]
/// and well-formed provider rejections as [`AiError::Provider`]; the
/// fallback policy depends on that distinction.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a completion and return the raw content of the first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError>;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;
}
