//! Plan generation coordinator.
//!
//! This crate provides the [`PlanGenerationCoordinator`] which drives one
//! attempt from request to delivered plan: it guards the session, collects
//! payment when the category is paid, generates the plan with the AI client
//! and counts the result.
//!
//! # Flow
//!
//! ```text
//! GenerationRequest
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      COORDINATOR                            │
//! │                                                             │
//! │  1. GuardCheck: one attempt in flight per session           │
//! │         ↓                                                   │
//! │  2. PaymentPending: create intent (skipped when free or     │
//! │     a confirmed, unused payment exists)                     │
//! │         ↓                                                   │
//! │  3. PaymentPolling: check until confirmed / failed / timeout│
//! │         ↓                                                   │
//! │  4. Generating: AI call, phase ticker running               │
//! │         ↓                                                   │
//! │  5. Counting: idempotent counter upsert                     │
//! │         ↓                                                   │
//! │  6. Done → PlanOutcome                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any step can end in `Failed` with a [`GenerationError`]; the guard is
//! released either way.
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{GenerationOptions, PlanGenerationCoordinator, Session};
//! use plan_core::{GenerationRequest, PlanCategory};
//!
//! let coordinator = PlanGenerationCoordinator::from_env().await?;
//! let session = Session::new("user-1");
//!
//! let request = GenerationRequest::new("user-1", PlanCategory::Meal, preferences);
//! let mut handle = coordinator.start(session, request, GenerationOptions::default());
//!
//! let mut events = handle.take_events().unwrap();
//! while let Some(event) = events.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! let outcome = handle.outcome().await?;
//! ```

mod config;
mod coordinator;
mod counter;
mod error;
mod events;
mod guard;
mod ledger;
mod phase;
mod prompt;
mod session;

pub use config::{CoordinatorConfig, PricingConfig};
pub use coordinator::{GenerationOptions, PlanGenerationCoordinator, PlanHandle, PlanOutcome};
pub use counter::GenerationCounter;
pub use error::{ErrorOrigin, GenerationError, SuggestedAction};
pub use events::{AttemptState, PlanEvent};
pub use guard::{GenerationGuard, GuardPermit, GuardRejection, GuardState};
pub use ledger::PaymentLedger;
pub use phase::{
    PhaseSimulator, PhaseTicker, ANALYZING_AFTER_SECS, FINALIZING_AFTER_SECS,
    GENERATING_AFTER_SECS,
};
pub use prompt::render_prompt;
pub use session::Session;

// Re-export for convenience
pub use payment_gateway::PollConfig;
pub use plan_core::{GenerationRequest, PlanCategory, PlanDocument};
