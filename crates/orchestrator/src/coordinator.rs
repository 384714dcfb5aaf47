//! End-to-end plan generation: guard, payment, AI, counting.

use std::env;
use std::sync::Arc;

use database::{Database, DEFAULT_DATABASE_URL};
use payment_gateway::{PaymentGatewayConfig, PaymentPoller, PollOutcome};
use plan_brain::{AiGenerationClient, GenerationContext};
use plan_core::{GenerationRequest, PaymentGateway, PaymentStatus, PlanDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::counter::GenerationCounter;
use crate::error::GenerationError;
use crate::events::{AttemptState, Events, PlanEvent};
use crate::ledger::PaymentLedger;
use crate::phase::PhaseSimulator;
use crate::prompt::render_prompt;
use crate::session::Session;

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Retry on the fallback AI provider if the primary is unreachable.
    pub use_fallback: bool,
    /// Allow a new attempt after the session already made one.
    pub retry: bool,
}

/// A delivered plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub attempt_id: Uuid,
    pub plan: PlanDocument,
    /// Count after this generation. `None` if the counter could not be
    /// updated; the plan is delivered regardless.
    pub generation_count: Option<i64>,
    /// Payment intent that paid for this plan, if the category is paid.
    pub paid_intent: Option<Uuid>,
}

/// Runs plan generation attempts.
///
/// Cheap to clone: every clone shares the same gateway, AI client and
/// database pool.
#[derive(Clone)]
pub struct PlanGenerationCoordinator {
    gateway: Arc<dyn PaymentGateway>,
    poller: PaymentPoller,
    ai: AiGenerationClient,
    counter: GenerationCounter,
    ledger: PaymentLedger,
    config: CoordinatorConfig,
}

impl PlanGenerationCoordinator {
    /// Create a coordinator. `db` must already be migrated.
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ai: AiGenerationClient,
        db: Database,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            poller: PaymentPoller::new(gateway.clone(), config.poll),
            gateway,
            ai,
            counter: GenerationCounter::new(db.clone()),
            ledger: PaymentLedger::new(db),
            config,
        }
    }

    /// Create a coordinator from environment variables.
    ///
    /// Reads the payment and AI settings of their crates, pricing and
    /// polling from [`CoordinatorConfig::from_env`], and the database URL
    /// from `SQLITE_PATH` (default: `sqlite:plans.db?mode=rwc`).
    pub async fn from_env() -> Result<Self, GenerationError> {
        let gateway = payment_gateway::connect(&PaymentGatewayConfig::from_env()?)?;
        let ai = AiGenerationClient::from_env()?;

        let url = env::var("SQLITE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let db = Database::connect(&url)
            .await
            .map_err(|e| GenerationError::Configuration(format!("database: {}", e)))?;
        db.migrate()
            .await
            .map_err(|e| GenerationError::Configuration(format!("database migration: {}", e)))?;

        Ok(Self::new(gateway, ai, db, CoordinatorConfig::from_env()))
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn counter(&self) -> &GenerationCounter {
        &self.counter
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    /// Run one attempt to completion on the current task.
    pub async fn request_plan(
        &self,
        session: &Session,
        request: GenerationRequest,
        options: GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<PlanOutcome, GenerationError> {
        let events = Events::new(request.attempt_id, None);
        self.run(session, request, options, &cancel, &events).await
    }

    /// Run one attempt on a spawned task.
    ///
    /// Dropping the returned handle cancels the attempt.
    pub fn start(
        &self,
        session: Session,
        request: GenerationRequest,
        options: GenerationOptions,
    ) -> PlanHandle {
        let attempt_id = request.attempt_id;
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let coordinator = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let events = Events::new(attempt_id, Some(tx));
            coordinator
                .run(&session, request, options, &token, &events)
                .await
        });

        PlanHandle {
            attempt_id,
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
            events: Some(rx),
            task,
        }
    }

    async fn run(
        &self,
        session: &Session,
        request: GenerationRequest,
        options: GenerationOptions,
        cancel: &CancellationToken,
        events: &Events,
    ) -> Result<PlanOutcome, GenerationError> {
        let attempt_id = request.attempt_id;
        info!(
            "Attempt {} started: {} for {} (session {})",
            attempt_id,
            request.category,
            request.user_id,
            session.id()
        );
        events.state(AttemptState::Idle);

        let result = self.execute(session, &request, options, cancel, events).await;

        match result {
            Ok(ref outcome) => {
                info!(
                    "Attempt {} done: {} count {:?}",
                    attempt_id, request.category, outcome.generation_count
                );
                events.state(AttemptState::Done);
                events.send(PlanEvent::Completed {
                    attempt_id,
                    generation_count: outcome.generation_count,
                    plan: outcome.plan.clone(),
                });
            }
            Err(ref err) => {
                info!("Attempt {} failed: {}", attempt_id, err);
                events.state(AttemptState::Failed);
                events.send(PlanEvent::failed(attempt_id, err));
            }
        }

        result
    }

    async fn execute(
        &self,
        session: &Session,
        request: &GenerationRequest,
        options: GenerationOptions,
        cancel: &CancellationToken,
        events: &Events,
    ) -> Result<PlanOutcome, GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        validate(request)?;

        events.state(AttemptState::GuardCheck);
        let _permit = session.guard().acquire(request.attempt_id, options.retry)?;

        let paid_intent = self.ensure_paid(request, cancel, events).await?;

        events.state(AttemptState::Generating);
        let plan = self.generate(request, options, cancel, events).await?;

        events.state(AttemptState::Counting);
        let generation_count = match self
            .counter
            .increment(&request.user_id, request.category, request.attempt_id)
            .await
        {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(
                    "Failed to count attempt {} for {}: {}",
                    request.attempt_id, request.user_id, e
                );
                None
            }
        };

        if let Some(intent_id) = paid_intent {
            if let Err(e) = self.ledger.consume(intent_id, request.attempt_id).await {
                warn!("Failed to mark payment {} as used: {}", intent_id, e);
            }
        }

        Ok(PlanOutcome {
            attempt_id: request.attempt_id,
            plan,
            generation_count,
            paid_intent,
        })
    }

    /// Make sure the attempt is paid for. Returns the paying intent, or
    /// `None` for free categories.
    async fn ensure_paid(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        events: &Events,
    ) -> Result<Option<Uuid>, GenerationError> {
        let price = self.config.pricing.price_for(request.category);
        if price <= 0 {
            debug!("{} is free, skipping payment", request.category);
            return Ok(None);
        }

        match self.ledger.find_reusable(&request.user_id, request.category).await {
            Ok(Some(record)) => match record.id.parse::<Uuid>() {
                Ok(id) => return Ok(Some(id)),
                Err(e) => warn!("Ignoring payment record with bad id {}: {}", record.id, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Could not read payment ledger: {}", e),
        }

        if let Some(id) = self.recheck_pending(request, cancel).await? {
            return Ok(Some(id));
        }

        events.state(AttemptState::PaymentPending);
        let intent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
            created = self.gateway.create(&request.user_id, price, request.category.label()) => created?,
        };
        info!(
            "Created {} payment {} ({} cents) for attempt {}",
            intent.provider, intent.external_id, intent.amount_cents, request.attempt_id
        );

        if let Err(e) = self
            .ledger
            .record(&intent, request.category, request.attempt_id)
            .await
        {
            warn!("Failed to record payment {}: {}", intent.external_id, e);
        }

        events.send(PlanEvent::PaymentCreated {
            attempt_id: request.attempt_id,
            intent_id: intent.id,
            external_id: intent.external_id.clone(),
            amount_cents: intent.amount_cents,
            checkout_reference: intent.checkout_reference.clone(),
        });

        events.state(AttemptState::PaymentPolling);
        match self.poller.poll(&intent.external_id, cancel).await? {
            PollOutcome::Confirmed => {
                self.store_status(intent.id, PaymentStatus::Confirmed).await;
                Ok(Some(intent.id))
            }
            PollOutcome::Failed(status) => {
                self.store_status(intent.id, status).await;
                Err(GenerationError::PaymentFailed(status))
            }
            // Left pending: a later check may still confirm it.
            PollOutcome::TimedOut => Err(GenerationError::TimedOut),
            PollOutcome::Cancelled => Err(GenerationError::Cancelled),
        }
    }

    /// Check the unconsumed intents still pending for (user, category) with
    /// the gateway, storing what it reports. Returns the first one that is
    /// now confirmed.
    async fn recheck_pending(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<Uuid>, GenerationError> {
        let pending = match self.ledger.pending(&request.user_id, request.category).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Could not read pending payments: {}", e);
                return Ok(None);
            }
        };

        let provider = self.gateway.provider();
        for record in pending {
            if record.provider != provider.as_str() {
                continue;
            }
            let Ok(intent_id) = record.id.parse::<Uuid>() else {
                warn!("Ignoring payment record with bad id {}", record.id);
                continue;
            };

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                checked = self.gateway.check_status(&record.external_id) => checked,
            };

            match status {
                Ok(PaymentStatus::Pending) => {
                    debug!("Payment {} still pending", record.external_id);
                }
                Ok(status) => {
                    self.store_status(intent_id, status).await;
                    if status == PaymentStatus::Confirmed {
                        info!(
                            "Earlier payment {} is now confirmed, using it for attempt {}",
                            record.external_id, request.attempt_id
                        );
                        return Ok(Some(intent_id));
                    }
                }
                Err(e) => warn!("Could not re-check payment {}: {}", record.external_id, e),
            }
        }

        Ok(None)
    }

    async fn store_status(&self, intent_id: Uuid, status: PaymentStatus) {
        if let Err(e) = self.ledger.update_status(intent_id, status).await {
            warn!("Failed to store status {} for payment {}: {}", status, intent_id, e);
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        options: GenerationOptions,
        cancel: &CancellationToken,
        events: &Events,
    ) -> Result<PlanDocument, GenerationError> {
        let prompt = render_prompt(request);
        let context = GenerationContext::new(request.category).with_fallback(options.use_fallback);

        let phase_events = events.clone();
        let ticker = PhaseSimulator::start(move |state| phase_events.phase(state));

        let fallback_available = self.ai.has_fallback() && !options.use_fallback;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            generated = self.ai.generate(&prompt, &context) => {
                generated.map_err(|e| GenerationError::from_ai(e, fallback_available))
            }
        };

        ticker.stop().await;
        result
    }
}

fn validate(request: &GenerationRequest) -> Result<(), GenerationError> {
    if request.user_id.trim().is_empty() {
        return Err(GenerationError::Validation("user id is required".to_string()));
    }
    if !matches!(request.preferences, Value::Object(_) | Value::Null) {
        return Err(GenerationError::Validation(
            "preferences must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

/// Handle to an attempt started with [`PlanGenerationCoordinator::start`].
pub struct PlanHandle {
    attempt_id: Uuid,
    cancel: CancellationToken,
    _guard: DropGuard,
    events: Option<mpsc::UnboundedReceiver<PlanEvent>>,
    task: JoinHandle<Result<PlanOutcome, GenerationError>>,
}

impl PlanHandle {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    /// Cancel the attempt. Calling it again, or after the attempt ended,
    /// does nothing.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this attempt, for callers that outlive the handle.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Take the event stream. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<PlanEvent>> {
        self.events.take()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the attempt to end.
    pub async fn outcome(self) -> Result<PlanOutcome, GenerationError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(GenerationError::Cancelled),
        }
    }
}
