//! Error types for the provider seams.

use thiserror::Error;

use crate::payment::PaymentProvider;

/// Errors returned by a [`PaymentGateway`](crate::PaymentGateway).
#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    /// Credentials or endpoint configuration are missing.
    #[error("payment configuration error: {0}")]
    Configuration(String),

    /// The caller supplied an invalid amount, description or user id.
    #[error("invalid payment request: {0}")]
    Validation(String),

    /// The provider answered with a non-success response.
    #[error("{provider} returned {status}: {message}")]
    Provider {
        provider: PaymentProvider,
        status: u16,
        message: String,
        /// Raw response body, kept for diagnostics.
        raw: String,
    },

    /// The request never reached the provider (DNS, timeout, refused).
    #[error("payment network error: {0}")]
    Network(String),

    /// The provider does not know this payment id.
    #[error("payment not found: {0}")]
    NotFound(String),
}

impl PaymentError {
    /// Whether a polling loop may keep going after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PaymentError::Provider { .. } | PaymentError::Network(_) | PaymentError::NotFound(_)
        )
    }
}

/// Errors returned by a [`CompletionProvider`](crate::CompletionProvider) or
/// by plan parsing.
#[derive(Debug, Clone, Error)]
pub enum AiError {
    /// API key or endpoint missing.
    #[error("AI configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure (DNS, timeout, connection refused).
    #[error("AI network error: {0}")]
    Network(String),

    /// The provider returned a well-formed error.
    #[error("{provider} rejected the request: {message}")]
    Provider { provider: String, message: String },

    /// The provider answered but the content is not a structured plan.
    #[error("malformed plan response: {0}")]
    MalformedResponse(String),
}

impl AiError {
    /// Whether this error was caused by the transport rather than the provider.
    pub fn is_transport(&self) -> bool {
        matches!(self, AiError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_payment_errors() {
        assert!(PaymentError::Network("refused".into()).is_transient());
        assert!(PaymentError::NotFound("pay_1".into()).is_transient());
        assert!(PaymentError::Provider {
            provider: PaymentProvider::Asaas,
            status: 502,
            message: "bad gateway".into(),
            raw: String::new(),
        }
        .is_transient());
        assert!(!PaymentError::Configuration("missing key".into()).is_transient());
        assert!(!PaymentError::Validation("amount".into()).is_transient());
    }

    #[test]
    fn test_provider_error_display() {
        let err = PaymentError::Provider {
            provider: PaymentProvider::MercadoPago,
            status: 400,
            message: "invalid amount".into(),
            raw: r#"{"message":"invalid amount"}"#.into(),
        };
        assert_eq!(err.to_string(), "mercadopago returned 400: invalid amount");
    }

    #[test]
    fn test_ai_transport_classification() {
        assert!(AiError::Network("timeout".into()).is_transport());
        assert!(!AiError::Provider {
            provider: "primary".into(),
            message: "content policy".into()
        }
        .is_transport());
        assert!(!AiError::MalformedResponse("not json".into()).is_transport());
    }
}
