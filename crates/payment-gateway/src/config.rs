//! Configuration for the payment backends.

use std::env;
use std::fmt;

use plan_core::{PaymentError, PaymentProvider};

/// Default request timeout for payment function calls, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration for the payment gateway backend.
///
/// Each variant corresponds to a supported provider. Credentials may be
/// empty here; adapters fail with [`PaymentError::Configuration`] when
/// they are actually used without them.
#[derive(Clone)]
pub enum PaymentGatewayConfig {
    /// Asaas backend, reached through the `create-payment` / `check-payment` functions.
    Asaas {
        functions_url: String,
        api_key: String,
    },

    /// Mercado Pago backend, reached through the same function pair.
    MercadoPago {
        functions_url: String,
        access_token: String,
    },
}

impl PaymentGatewayConfig {
    /// Create a configuration from environment variables.
    ///
    /// Expects:
    /// - `PAYMENT_PROVIDER` - `asaas` (default) or `mercadopago`
    ///
    /// and the variables of the selected backend, see
    /// [`asaas_from_env`](Self::asaas_from_env) and
    /// [`mercado_pago_from_env`](Self::mercado_pago_from_env).
    pub fn from_env() -> Result<Self, PaymentError> {
        let provider = env::var("PAYMENT_PROVIDER")
            .unwrap_or_else(|_| "asaas".to_string())
            .parse::<PaymentProvider>()
            .map_err(PaymentError::Configuration)?;

        Ok(match provider {
            PaymentProvider::Asaas => Self::asaas_from_env(),
            PaymentProvider::MercadoPago => Self::mercado_pago_from_env(),
        })
    }

    /// Create an Asaas configuration from environment variables.
    ///
    /// Expects:
    /// - `ASAAS_FUNCTIONS_URL` - Base URL of the payment functions
    /// - `ASAAS_API_KEY` - Bearer token for the functions
    pub fn asaas_from_env() -> Self {
        PaymentGatewayConfig::Asaas {
            functions_url: env::var("ASAAS_FUNCTIONS_URL").unwrap_or_default(),
            api_key: env::var("ASAAS_API_KEY").unwrap_or_default(),
        }
    }

    /// Create a Mercado Pago configuration from environment variables.
    ///
    /// Expects:
    /// - `MERCADOPAGO_FUNCTIONS_URL` - Base URL of the payment functions
    /// - `MERCADOPAGO_ACCESS_TOKEN` - Bearer token for the functions
    pub fn mercado_pago_from_env() -> Self {
        PaymentGatewayConfig::MercadoPago {
            functions_url: env::var("MERCADOPAGO_FUNCTIONS_URL").unwrap_or_default(),
            access_token: env::var("MERCADOPAGO_ACCESS_TOKEN").unwrap_or_default(),
        }
    }

    /// The provider this configuration selects.
    pub fn provider(&self) -> PaymentProvider {
        match self {
            PaymentGatewayConfig::Asaas { .. } => PaymentProvider::Asaas,
            PaymentGatewayConfig::MercadoPago { .. } => PaymentProvider::MercadoPago,
        }
    }

    /// Base URL of the payment functions.
    pub fn functions_url(&self) -> &str {
        match self {
            PaymentGatewayConfig::Asaas { functions_url, .. }
            | PaymentGatewayConfig::MercadoPago { functions_url, .. } => functions_url,
        }
    }

    pub(crate) fn token(&self) -> &str {
        match self {
            PaymentGatewayConfig::Asaas { api_key, .. } => api_key,
            PaymentGatewayConfig::MercadoPago { access_token, .. } => access_token,
        }
    }
}

impl fmt::Debug for PaymentGatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentGatewayConfig")
            .field("provider", &self.provider())
            .field("functions_url", &self.functions_url())
            .field("token", &if self.token().is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}
