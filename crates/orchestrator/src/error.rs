//! Error types for plan generation.

use plan_core::{AiError, PaymentError, PaymentStatus};
use serde::Serialize;
use thiserror::Error;

use crate::guard::GuardRejection;

/// Which collaborator an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorOrigin {
    Payment,
    Ai,
}

impl std::fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorOrigin::Payment => f.write_str("payment"),
            ErrorOrigin::Ai => f.write_str("AI"),
        }
    }
}

/// What the caller can do about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedAction {
    /// Try the same request again.
    Retry,
    /// Try again with the fallback AI provider enabled.
    SwitchToFallback,
}

/// Terminal failure of a plan generation attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Credentials or endpoints are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request itself is invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A provider rejected the call.
    #[error("{origin} provider error: {message}")]
    Provider { origin: ErrorOrigin, message: String },

    /// A provider could not be reached.
    #[error("{origin} network error: {message}")]
    Network {
        origin: ErrorOrigin,
        message: String,
        /// A fallback AI provider is configured and this attempt did not try it.
        fallback_available: bool,
    },

    /// The payment was not confirmed in time.
    #[error("payment was not confirmed in time")]
    TimedOut,

    /// The payment ended in a non-success status.
    #[error("payment {0}")]
    PaymentFailed(PaymentStatus),

    /// The AI answered with something that is not a plan.
    #[error("malformed plan response: {0}")]
    MalformedResponse(String),

    /// A generation is already in flight for this session.
    #[error("a plan is already being generated")]
    AlreadyGenerating,

    /// This session already made an attempt and the caller did not ask to retry.
    #[error("a plan was already requested in this session")]
    AlreadyAttempted,

    /// The attempt was cancelled.
    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "CONFIGURATION",
            GenerationError::Validation(_) => "VALIDATION",
            GenerationError::Provider { .. } => "PROVIDER",
            GenerationError::Network { .. } => "NETWORK",
            GenerationError::TimedOut => "TIMED_OUT",
            GenerationError::PaymentFailed(_) => "PAYMENT_FAILED",
            GenerationError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            GenerationError::AlreadyGenerating => "ALREADY_GENERATING",
            GenerationError::AlreadyAttempted => "ALREADY_ATTEMPTED",
            GenerationError::Cancelled => "CANCELLED",
        }
    }

    /// One notification suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(_) => {
                "Plan generation is not available right now. Please contact support.".to_string()
            }
            GenerationError::Validation(msg) => format!("Please check your request: {}", msg),
            GenerationError::Provider {
                origin: ErrorOrigin::Payment,
                ..
            } => "The payment provider could not process your payment. Please try again.".to_string(),
            GenerationError::Provider {
                origin: ErrorOrigin::Ai,
                ..
            } => "The plan service rejected the request. Please try again later.".to_string(),
            GenerationError::Network {
                origin: ErrorOrigin::Payment,
                ..
            } => "Could not reach the payment provider. Check your connection and try again.".to_string(),
            GenerationError::Network {
                origin: ErrorOrigin::Ai,
                fallback_available: true,
                ..
            } => "Could not reach the plan service. Try again using the alternative provider.".to_string(),
            GenerationError::Network {
                origin: ErrorOrigin::Ai,
                ..
            } => "Could not reach the plan service. Please try again later.".to_string(),
            GenerationError::TimedOut => {
                "We did not receive your payment confirmation in time. If you paid, try again and your payment will be used.".to_string()
            }
            GenerationError::PaymentFailed(status) => match status {
                PaymentStatus::Expired => "Your payment expired. Please start a new payment.".to_string(),
                _ => "Your payment was not approved. Please try again.".to_string(),
            },
            GenerationError::MalformedResponse(_) => {
                "The generated plan could not be read. Please try again.".to_string()
            }
            GenerationError::AlreadyGenerating => {
                "Your plan is already being generated. Please wait.".to_string()
            }
            GenerationError::AlreadyAttempted => {
                "A plan was already requested. Confirm to generate a new one.".to_string()
            }
            GenerationError::Cancelled => "Plan generation was cancelled.".to_string(),
        }
    }

    /// Follow-up the caller may offer, if any.
    pub fn suggested_action(&self) -> Option<SuggestedAction> {
        match self {
            GenerationError::Network {
                fallback_available: true,
                ..
            } => Some(SuggestedAction::SwitchToFallback),
            GenerationError::Network { .. }
            | GenerationError::Provider { .. }
            | GenerationError::TimedOut
            | GenerationError::PaymentFailed(_)
            | GenerationError::MalformedResponse(_) => Some(SuggestedAction::Retry),
            GenerationError::Configuration(_)
            | GenerationError::Validation(_)
            | GenerationError::AlreadyGenerating
            | GenerationError::AlreadyAttempted
            | GenerationError::Cancelled => None,
        }
    }
}

impl From<PaymentError> for GenerationError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Configuration(msg) => GenerationError::Configuration(msg),
            PaymentError::Validation(msg) => GenerationError::Validation(msg),
            PaymentError::Network(message) => GenerationError::Network {
                origin: ErrorOrigin::Payment,
                message,
                fallback_available: false,
            },
            other @ (PaymentError::Provider { .. } | PaymentError::NotFound(_)) => {
                GenerationError::Provider {
                    origin: ErrorOrigin::Payment,
                    message: other.to_string(),
                }
            }
        }
    }
}

impl GenerationError {
    /// Map an AI failure. `fallback_available` is true when a fallback
    /// provider is configured and the attempt did not use it.
    pub fn from_ai(err: AiError, fallback_available: bool) -> Self {
        match err {
            AiError::Configuration(msg) => GenerationError::Configuration(msg),
            AiError::Network(message) => GenerationError::Network {
                origin: ErrorOrigin::Ai,
                message,
                fallback_available,
            },
            other @ AiError::Provider { .. } => GenerationError::Provider {
                origin: ErrorOrigin::Ai,
                message: other.to_string(),
            },
            AiError::MalformedResponse(msg) => GenerationError::MalformedResponse(msg),
        }
    }
}

impl From<AiError> for GenerationError {
    fn from(err: AiError) -> Self {
        GenerationError::from_ai(err, false)
    }
}

impl From<GuardRejection> for GenerationError {
    fn from(rejection: GuardRejection) -> Self {
        match rejection {
            GuardRejection::AlreadyGenerating { .. } => GenerationError::AlreadyGenerating,
            GuardRejection::AlreadyAttempted => GenerationError::AlreadyAttempted,
        }
    }
}
