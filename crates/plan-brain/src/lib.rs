//! AI plan generation.
//!
//! This crate turns a user prompt into a structured [`PlanDocument`] by
//! calling an OpenAI-compatible chat completion API.
//!
//! # Features
//!
//! - Primary provider plus an optional fallback, used only when the
//!   primary cannot be reached and the request opts in
//! - Per-category system prompts, overridable from a prompt directory
//! - Tolerant parsing of fenced or prose-wrapped JSON output
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use plan_brain::{AiGenerationClient, GenerationContext, PlanCategory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AiGenerationClient::from_env()?;
//!     let context = GenerationContext::new(PlanCategory::Meal).with_fallback(true);
//!     let plan = client.generate("Vegetarian, 2000 kcal, no nuts", &context).await?;
//!     println!("{}", serde_json::Value::Object(plan.content));
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;
mod parse;
mod provider;

pub use client::{AiGenerationClient, GenerationContext};
pub use config::{
    AiProviderConfig, AiProviderConfigBuilder, PromptLibrary, DEFAULT_API_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
pub use parse::{parse_plan, strip_code_fence};
pub use provider::HttpCompletionProvider;

// Re-export plan-core types for convenience
pub use plan_core::{AiError, ChatMessage, CompletionProvider, PlanCategory, PlanDocument};
