//! Mock provider implementations for plan generation tests.
//!
//! This crate provides scripted implementations of the provider traits:
//! - `ScriptedGateway` - Payment gateway that replays a list of statuses
//! - `ScriptedCompletion` - Completion provider that replays a list of results
//! - `DelayedCompletion` - Wraps another provider with artificial delay
//!
//! For production use, see the `payment-gateway` and `plan-brain` crates.
//!
//! # Example
//!
//! ```rust
//! use mock_providers::{PaymentGateway, PaymentStatus, ScriptedGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = ScriptedGateway::confirms_on(2);
//!     let intent = gateway.create("user-1", 1990, "Meal plan").await.unwrap();
//!
//!     assert_eq!(gateway.check_status(&intent.external_id).await.unwrap(), PaymentStatus::Pending);
//!     assert_eq!(gateway.check_status(&intent.external_id).await.unwrap(), PaymentStatus::Confirmed);
//!     assert_eq!(gateway.check_calls(), 2);
//! }
//! ```

mod completion;
mod delayed;
mod gateway;

// Re-export plan-core types for convenience
pub use plan_core::{
    async_trait, AiError, ChatMessage, CompletionProvider, PaymentError, PaymentGateway,
    PaymentIntent, PaymentProvider, PaymentStatus,
};

// Export mock implementations
pub use completion::ScriptedCompletion;
pub use delayed::DelayedCompletion;
pub use gateway::ScriptedGateway;
