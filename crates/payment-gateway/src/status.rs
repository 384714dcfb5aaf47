//! Provider status vocabularies normalized into [`PaymentStatus`].

use plan_core::PaymentStatus;
use tracing::warn;

/// Normalize an Asaas charge status.
pub fn normalize_asaas(raw: &str) -> PaymentStatus {
    match raw.trim().to_uppercase().as_str() {
        "PENDING" | "AWAITING_RISK_ANALYSIS" | "AUTHORIZED" => PaymentStatus::Pending,
        "RECEIVED" | "CONFIRMED" | "RECEIVED_IN_CASH" => PaymentStatus::Confirmed,
        "OVERDUE" => PaymentStatus::Expired,
        "REFUNDED" | "REFUND_REQUESTED" | "REFUND_IN_PROGRESS" | "CHARGEBACK_REQUESTED"
        | "CHARGEBACK_DISPUTE" | "AWAITING_CHARGEBACK_REVERSAL" | "DELETED" | "FAILED"
        | "CANCELLED" => PaymentStatus::Failed,
        other => {
            warn!("Unknown Asaas payment status '{}', treating as pending", other);
            PaymentStatus::Pending
        }
    }
}

/// Normalize a Mercado Pago payment status.
pub fn normalize_mercado_pago(raw: &str) -> PaymentStatus {
    match raw.trim().to_lowercase().as_str() {
        "pending" | "in_process" | "in_mediation" | "authorized" => PaymentStatus::Pending,
        "approved" | "settled" => PaymentStatus::Confirmed,
        "expired" => PaymentStatus::Expired,
        "rejected" | "cancelled" | "refunded" | "charged_back" => PaymentStatus::Failed,
        other => {
            warn!("Unknown Mercado Pago payment status '{}', treating as pending", other);
            PaymentStatus::Pending
        }
    }
}
