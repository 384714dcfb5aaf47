//! Progress events emitted while an attempt runs.

use plan_core::{GenerationPhase, PhaseState, PlanDocument};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{GenerationError, SuggestedAction};

/// Where an attempt is in the generation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptState {
    Idle,
    GuardCheck,
    PaymentPending,
    PaymentPolling,
    Generating,
    Counting,
    Done,
    Failed,
}

/// Event sent to whoever watches an attempt, serialized as tagged JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    State {
        attempt_id: Uuid,
        state: AttemptState,
    },
    PaymentCreated {
        attempt_id: Uuid,
        intent_id: Uuid,
        external_id: String,
        amount_cents: i64,
        checkout_reference: Option<String>,
    },
    Phase {
        attempt_id: Uuid,
        phase: GenerationPhase,
        elapsed_seconds: u64,
    },
    Completed {
        attempt_id: Uuid,
        generation_count: Option<i64>,
        plan: PlanDocument,
    },
    Failed {
        attempt_id: Uuid,
        code: &'static str,
        message: String,
        action: Option<SuggestedAction>,
    },
}

impl PlanEvent {
    pub fn failed(attempt_id: Uuid, err: &GenerationError) -> Self {
        PlanEvent::Failed {
            attempt_id,
            code: err.code(),
            message: err.user_message(),
            action: err.suggested_action(),
        }
    }

    /// The `type` tag of the event.
    pub fn name(&self) -> &'static str {
        match self {
            PlanEvent::State { .. } => "state",
            PlanEvent::PaymentCreated { .. } => "payment_created",
            PlanEvent::Phase { .. } => "phase",
            PlanEvent::Completed { .. } => "completed",
            PlanEvent::Failed { .. } => "failed",
        }
    }

    /// Whether this is the last event of an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanEvent::Completed { .. } | PlanEvent::Failed { .. })
    }
}

/// Event sink for one attempt. Sending never fails: events for a watcher
/// that went away are dropped.
#[derive(Debug, Clone)]
pub(crate) struct Events {
    attempt_id: Uuid,
    tx: Option<mpsc::UnboundedSender<PlanEvent>>,
}

impl Events {
    pub(crate) fn new(attempt_id: Uuid, tx: Option<mpsc::UnboundedSender<PlanEvent>>) -> Self {
        Self { attempt_id, tx }
    }

    pub(crate) fn send(&self, event: PlanEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn state(&self, state: AttemptState) {
        self.send(PlanEvent::State {
            attempt_id: self.attempt_id,
            state,
        });
    }

    pub(crate) fn phase(&self, state: PhaseState) {
        self.send(PlanEvent::Phase {
            attempt_id: self.attempt_id,
            phase: state.phase,
            elapsed_seconds: state.elapsed_seconds,
        });
    }
}
