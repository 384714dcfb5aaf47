//! Plan request and result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The kind of plan a user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanCategory {
    Meal,
    Workout,
    Rehab,
}

impl PlanCategory {
    /// All categories, in display order.
    pub const ALL: [PlanCategory; 3] = [PlanCategory::Meal, PlanCategory::Workout, PlanCategory::Rehab];

    /// Stable string form, used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCategory::Meal => "MEAL",
            PlanCategory::Workout => "WORKOUT",
            PlanCategory::Rehab => "REHAB",
        }
    }

    /// Human-readable name, used in payment descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            PlanCategory::Meal => "Meal plan",
            PlanCategory::Workout => "Workout plan",
            PlanCategory::Rehab => "Rehabilitation plan",
        }
    }

    /// Lowercase stem used for per-category files and env vars.
    pub fn slug(&self) -> &'static str {
        match self {
            PlanCategory::Meal => "meal",
            PlanCategory::Workout => "workout",
            PlanCategory::Rehab => "rehab",
        }
    }
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MEAL" | "DIET" => Ok(PlanCategory::Meal),
            "WORKOUT" => Ok(PlanCategory::Workout),
            "REHAB" => Ok(PlanCategory::Rehab),
            other => Err(format!("unknown plan category: {}", other)),
        }
    }
}

/// A single request for a plan. Created per call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_id: String,
    pub category: PlanCategory,
    /// Opaque user preferences forwarded to the prompt.
    pub preferences: Value,
    /// Unit of idempotency for guard acquisition and counter increments.
    pub attempt_id: Uuid,
}

impl GenerationRequest {
    /// Create a request with a fresh attempt id.
    pub fn new(user_id: impl Into<String>, category: PlanCategory, preferences: Value) -> Self {
        Self {
            user_id: user_id.into(),
            category,
            preferences,
            attempt_id: Uuid::new_v4(),
        }
    }
}

/// A generated plan: the structured object emitted by the AI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub category: PlanCategory,
    pub content: Map<String, Value>,
}

impl PlanDocument {
    /// Get a top-level field of the plan.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }
}

/// Cosmetic progress phase shown while a plan is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationPhase {
    Preparing,
    Analyzing,
    Generating,
    Finalizing,
}

/// Phase plus the whole seconds elapsed since generation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: GenerationPhase,
    pub elapsed_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!("meal".parse::<PlanCategory>().unwrap(), PlanCategory::Meal);
        assert_eq!("diet".parse::<PlanCategory>().unwrap(), PlanCategory::Meal);
        assert_eq!(" REHAB ".parse::<PlanCategory>().unwrap(), PlanCategory::Rehab);
        assert!("yoga".parse::<PlanCategory>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&PlanCategory::Workout).unwrap();
        assert_eq!(json, "\"WORKOUT\"");
        let parsed: PlanCategory = serde_json::from_str("\"MEAL\"").unwrap();
        assert_eq!(parsed, PlanCategory::Meal);
    }

    #[test]
    fn test_request_gets_unique_attempt_ids() {
        let a = GenerationRequest::new("user-1", PlanCategory::Meal, Value::Null);
        let b = GenerationRequest::new("user-1", PlanCategory::Meal, Value::Null);
        assert_ne!(a.attempt_id, b.attempt_id);
    }

    #[test]
    fn test_phases_are_ordered() {
        assert!(GenerationPhase::Preparing < GenerationPhase::Analyzing);
        assert!(GenerationPhase::Analyzing < GenerationPhase::Generating);
        assert!(GenerationPhase::Generating < GenerationPhase::Finalizing);
    }
}
