//! User prompt built from a generation request.

use plan_core::GenerationRequest;
use serde_json::Value;

/// Render the user message sent to the AI for `request`.
pub fn render_prompt(request: &GenerationRequest) -> String {
    let preferences = match &request.preferences {
        Value::Null => "No preferences were provided.".to_string(),
        Value::Object(map) if map.is_empty() => "No preferences were provided.".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };

    format!(
        "Create a personalized {} for this user.\n\nUser preferences:\n{}\n\nRespond with a single JSON object.",
        request.category.label().to_lowercase(),
        preferences
    )
}
