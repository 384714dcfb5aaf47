//! Core types and provider traits for paid plan generation.
//!
//! This crate provides the shared vocabulary used by every other crate in
//! the workspace. It defines:
//!
//! - [`PaymentGateway`] - The trait each payment backend adapter implements
//! - [`CompletionProvider`] - The trait each AI chat-completion backend implements
//! - [`PlanCategory`], [`GenerationRequest`], [`PlanDocument`] - Plan request/response types
//! - [`PaymentIntent`], [`PaymentStatus`] - Payment tracking types
//! - [`PaymentError`] / [`AiError`] - Error taxonomies for the two provider seams
//!
//! # Example
//!
//! ```rust
//! use plan_core::{async_trait, AiError, ChatMessage, CompletionProvider};
//!
//! struct StaticProvider;
//!
//! #[async_trait]
//! impl CompletionProvider for StaticProvider {
//!     async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, AiError> {
//!         Ok(r#"{"meals": []}"#.to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "StaticProvider"
//!     }
//! }
//! ```

mod completion;
mod error;
mod payment;
mod plan;

pub use completion::{ChatMessage, CompletionProvider};
pub use error::{AiError, PaymentError};
pub use payment::{PaymentGateway, PaymentIntent, PaymentProvider, PaymentStatus};
pub use plan::{GenerationPhase, GenerationRequest, PhaseState, PlanCategory, PlanDocument};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
