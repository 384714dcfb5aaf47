//! Record of created payment intents.
//!
//! A confirmed intent that no successful generation has used yet pays for
//! the next attempt in the same category, so a generation that fails after
//! payment does not charge the user again.

use database::{payment_intent, Database, DatabaseError, NewPaymentIntent, PaymentIntentRecord};
use plan_core::{PaymentIntent, PaymentStatus, PlanCategory};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PaymentLedger {
    db: Database,
}

impl PaymentLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store a freshly created intent for `attempt_id`.
    pub async fn record(
        &self,
        intent: &PaymentIntent,
        category: PlanCategory,
        attempt_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let id = intent.id.to_string();
        let attempt = attempt_id.to_string();

        payment_intent::insert(
            self.db.pool(),
            &NewPaymentIntent {
                id: &id,
                external_id: &intent.external_id,
                provider: intent.provider.as_str(),
                user_id: &intent.user_id,
                category: category.as_str(),
                description: &intent.description,
                amount_cents: intent.amount_cents,
                status: intent.status.as_str(),
                checkout_reference: intent.checkout_reference.as_deref(),
                attempt_id: &attempt,
            },
        )
        .await?;

        debug!("Recorded intent {} ({}) for attempt {}", id, intent.external_id, attempt_id);
        Ok(())
    }

    pub async fn update_status(
        &self,
        intent_id: Uuid,
        status: PaymentStatus,
    ) -> Result<(), DatabaseError> {
        payment_intent::update_status(self.db.pool(), &intent_id.to_string(), status.as_str()).await
    }

    /// A confirmed intent for (user, category) no attempt has consumed yet.
    pub async fn find_reusable(
        &self,
        user_id: &str,
        category: PlanCategory,
    ) -> Result<Option<PaymentIntentRecord>, DatabaseError> {
        let found =
            payment_intent::find_unconsumed_confirmed(self.db.pool(), user_id, category.as_str())
                .await?;

        if let Some(ref record) = found {
            info!(
                "Reusing confirmed payment {} for {} {}",
                record.external_id, user_id, category
            );
        }

        Ok(found)
    }

    /// Intents for (user, category) that were left pending, oldest first.
    pub async fn pending(
        &self,
        user_id: &str,
        category: PlanCategory,
    ) -> Result<Vec<PaymentIntentRecord>, DatabaseError> {
        payment_intent::list_unconsumed_pending(self.db.pool(), user_id, category.as_str()).await
    }

    /// Mark the intent as paid for by `attempt_id`'s plan.
    pub async fn consume(&self, intent_id: Uuid, attempt_id: Uuid) -> Result<(), DatabaseError> {
        payment_intent::mark_consumed(
            self.db.pool(),
            &intent_id.to_string(),
            &attempt_id.to_string(),
        )
        .await
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PaymentIntentRecord>, DatabaseError> {
        payment_intent::list_for_user(self.db.pool(), user_id).await
    }
}
