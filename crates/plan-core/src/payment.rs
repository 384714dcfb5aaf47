//! Payment types and the gateway trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaymentError;

/// Normalized payment status shared by every provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Expired,
}

impl PaymentStatus {
    /// Stable string form, used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Confirmed => "CONFIRMED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Expired => "EXPIRED",
        }
    }

    /// Terminal statuses end polling and never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "CONFIRMED" => Ok(PaymentStatus::Confirmed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "EXPIRED" => Ok(PaymentStatus::Expired),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// The payment backends the gateway can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Asaas (PIX / boleto charges).
    Asaas,
    /// Mercado Pago (checkout preferences and PIX).
    #[serde(rename = "mercadopago")]
    MercadoPago,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Asaas => "asaas",
            PaymentProvider::MercadoPago => "mercadopago",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asaas" => Ok(PaymentProvider::Asaas),
            "mercadopago" | "mercado_pago" | "mercado-pago" => Ok(PaymentProvider::MercadoPago),
            other => Err(format!("unknown payment provider: {}", other)),
        }
    }
}

/// A payment request created with a provider, tracked until it reaches a
/// terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Local identifier.
    pub id: Uuid,
    /// Identifier assigned by the provider, used for status checks.
    pub external_id: String,
    /// User the charge belongs to.
    pub user_id: String,
    /// Description shown to the payer.
    pub description: String,
    /// Last known status.
    pub status: PaymentStatus,
    /// Amount in minor units (cents).
    pub amount_cents: i64,
    /// Backend that issued the charge.
    pub provider: PaymentProvider,
    /// Checkout link or PIX payload the user pays with, if the provider sent one.
    pub checkout_reference: Option<String>,
    /// When the intent was created.
    pub created_at: DateTime<Utc>,
}

/// Uniform create/check operations over a payment backend.
///
/// Each adapter is responsible for normalizing its own status vocabulary
/// into [`PaymentStatus`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_cents`.
    async fn create(
        &self,
        user_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Check the current status of a payment by its provider id.
    async fn check_status(&self, external_id: &str) -> Result<PaymentStatus, PaymentError>;

    /// The backend this gateway talks to.
    fn provider(&self) -> PaymentProvider;
}
