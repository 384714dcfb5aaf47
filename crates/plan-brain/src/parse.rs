//! Turn raw completion text into a [`PlanDocument`].

use plan_core::{AiError, PlanCategory, PlanDocument};
use serde_json::Value;

/// Parse completion content as a plan.
///
/// Models often wrap JSON in a markdown fence or add a sentence around it;
/// both are tolerated. Anything that is not a JSON object is rejected.
pub fn parse_plan(category: PlanCategory, raw: &str) -> Result<PlanDocument, AiError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(AiError::MalformedResponse("empty response".to_string()));
    }

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(first_err) => match outermost_object(body) {
            Some(candidate) => serde_json::from_str::<Value>(candidate)
                .map_err(|e| AiError::MalformedResponse(format!("invalid JSON: {}", e)))?,
            None => {
                return Err(AiError::MalformedResponse(format!("invalid JSON: {}", first_err)))
            }
        },
    };

    match value {
        Value::Object(content) if !content.is_empty() => Ok(PlanDocument { category, content }),
        Value::Object(_) => Err(AiError::MalformedResponse("plan object is empty".to_string())),
        other => Err(AiError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// Strip a surrounding ```` ``` ```` / ```` ```json ```` fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let plan = parse_plan(PlanCategory::Meal, r#"{"title":"Week 1","days":[]}"#).unwrap();
        assert_eq!(plan.category, PlanCategory::Meal);
        assert_eq!(plan.get("title").and_then(|v| v.as_str()), Some("Week 1"));
    }

    #[test]
    fn test_fenced_object() {
        let raw = "```json\n{\"title\": \"Strength\"}\n```";
        let plan = parse_plan(PlanCategory::Workout, raw).unwrap();
        assert_eq!(plan.get("title").and_then(|v| v.as_str()), Some("Strength"));

        let bare_fence = "```\n{\"title\": \"Knee\"}\n```\n";
        assert!(parse_plan(PlanCategory::Rehab, bare_fence).is_ok());
    }

    #[test]
    fn test_surrounding_prose() {
        let raw = "Here is your plan:\n{\"title\": \"Week 1\"}\nEnjoy!";
        let plan = parse_plan(PlanCategory::Meal, raw).unwrap();
        assert_eq!(plan.get("title").and_then(|v| v.as_str()), Some("Week 1"));
    }

    #[test]
    fn test_rejects_non_objects() {
        for raw in ["", "   ", "I cannot help with that.", "[1, 2, 3]", "\"plan\"", "{}"] {
            assert!(
                matches!(parse_plan(PlanCategory::Meal, raw), Err(AiError::MalformedResponse(_))),
                "expected rejection for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
