//! Scripted payment gateway - replays a fixed sequence of check results.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use plan_core::{async_trait, PaymentError, PaymentGateway, PaymentIntent, PaymentProvider, PaymentStatus};
use uuid::Uuid;

/// A payment gateway whose `check_status` answers come from a script.
///
/// Once the script is exhausted every further check returns the
/// fallback status (Pending unless configured otherwise). Payments marked
/// with [`ScriptedGateway::mark_paid`] report Confirmed regardless.
pub struct ScriptedGateway {
    provider: PaymentProvider,
    script: Mutex<VecDeque<Result<PaymentStatus, PaymentError>>>,
    exhausted: PaymentStatus,
    paid: Mutex<HashSet<String>>,
    create_error: Option<PaymentError>,
    create_calls: AtomicUsize,
    check_calls: AtomicUsize,
}

impl ScriptedGateway {
    /// Create a gateway that replays `script`, then reports Pending forever.
    pub fn new(script: Vec<Result<PaymentStatus, PaymentError>>) -> Self {
        Self {
            provider: PaymentProvider::Asaas,
            script: Mutex::new(script.into()),
            exhausted: PaymentStatus::Pending,
            paid: Mutex::new(HashSet::new()),
            create_error: None,
            create_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
        }
    }

    /// A gateway that reports Pending until the `tick`-th check, which confirms.
    pub fn confirms_on(tick: usize) -> Self {
        let mut script: Vec<_> = (1..tick).map(|_| Ok(PaymentStatus::Pending)).collect();
        script.push(Ok(PaymentStatus::Confirmed));
        Self::new(script).exhausted_with(PaymentStatus::Confirmed)
    }

    /// A gateway that never confirms.
    pub fn never_confirms() -> Self {
        Self::new(Vec::new())
    }

    /// A gateway whose `create` always fails with `error`.
    pub fn failing_create(error: PaymentError) -> Self {
        Self {
            create_error: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Set the status returned once the script is exhausted.
    pub fn exhausted_with(mut self, status: PaymentStatus) -> Self {
        self.exhausted = status;
        self
    }

    /// Report a different provider.
    pub fn with_provider(mut self, provider: PaymentProvider) -> Self {
        self.provider = provider;
        self
    }

    /// The user pays `external_id`: every later check of it reports Confirmed.
    pub fn mark_paid(&self, external_id: &str) {
        self.paid
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(external_id.to_string());
    }

    /// Number of `create` calls so far.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `check_status` calls so far.
    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create(
        &self,
        user_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref err) = self.create_error {
            return Err(err.clone());
        }

        Ok(PaymentIntent {
            id: Uuid::new_v4(),
            external_id: format!("pay_{}", n),
            user_id: user_id.to_string(),
            description: description.to_string(),
            status: PaymentStatus::Pending,
            amount_cents,
            provider: self.provider,
            checkout_reference: Some(format!("https://pay.example/pay_{}", n)),
            created_at: Utc::now(),
        })
    }

    async fn check_status(&self, external_id: &str) -> Result<PaymentStatus, PaymentError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let paid = self
            .paid
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(external_id);
        if paid {
            return Ok(PaymentStatus::Confirmed);
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        next.unwrap_or(Ok(self.exhausted))
    }

    fn provider(&self) -> PaymentProvider {
        self.provider
    }
}
