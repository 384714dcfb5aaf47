//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of plans generated for a user in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GenerationCount {
    /// User identifier.
    pub user_id: String,
    /// Plan category (e.g., "MEAL").
    pub category: String,
    /// Successful generations so far.
    pub count: i64,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A stored payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PaymentIntentRecord {
    /// Local intent id (UUID).
    pub id: String,
    /// Id assigned by the provider.
    pub external_id: String,
    /// Provider name (e.g., "asaas").
    pub provider: String,
    pub user_id: String,
    /// Plan category the intent pays for.
    pub category: String,
    pub description: String,
    pub amount_cents: i64,
    /// Last known status (e.g., "PENDING", "CONFIRMED").
    pub status: String,
    /// Checkout link or PIX payload shown to the user.
    pub checkout_reference: Option<String>,
    /// Attempt that created the intent.
    pub attempt_id: String,
    /// Attempt whose successful generation used the payment.
    pub consumed_by: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields needed to record a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentIntent<'a> {
    pub id: &'a str,
    pub external_id: &'a str,
    pub provider: &'a str,
    pub user_id: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub amount_cents: i64,
    pub status: &'a str,
    pub checkout_reference: Option<&'a str>,
    pub attempt_id: &'a str,
}
