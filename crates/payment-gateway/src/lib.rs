//! Payment gateway for paid plan generation.
//!
//! Two backends are supported, both reached through a pair of hosted
//! functions (`create-payment` and `check-payment`):
//!
//! - **Asaas** - charges with PIX / invoice checkout
//! - **Mercado Pago** - payments with an `init_point` checkout link
//!
//! Provider status vocabularies are normalized into
//! [`PaymentStatus`](plan_core::PaymentStatus). [`PaymentPoller`] watches a
//! created payment until it is confirmed, fails, or the poll times out.
//!
//! # Example
//!
//! ```rust,ignore
//! use payment_gateway::{connect, PaymentGatewayConfig, PaymentPoller, PollConfig};
//!
//! let gateway = connect(&PaymentGatewayConfig::from_env()?)?;
//! let intent = gateway.create("user-1", 1990, "Meal plan").await?;
//!
//! let poller = PaymentPoller::new(gateway, PollConfig::default());
//! let outcome = poller.spawn(intent.external_id).outcome().await?;
//! ```

mod asaas;
mod config;
mod functions;
mod mercado_pago;
mod poller;
pub mod status;

use std::sync::Arc;

use plan_core::{PaymentError, PaymentGateway, PaymentProvider};
use tracing::info;

pub use asaas::AsaasGateway;
pub use config::{PaymentGatewayConfig, DEFAULT_HTTP_TIMEOUT_SECS};
pub use mercado_pago::MercadoPagoGateway;
pub use poller::{
    PaymentPoller, PollConfig, PollHandle, PollOutcome, DEFAULT_MAX_POLL_DURATION,
    DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};

/// Build the gateway selected by `config`.
pub fn connect(config: &PaymentGatewayConfig) -> Result<Arc<dyn PaymentGateway>, PaymentError> {
    match config.provider() {
        PaymentProvider::Asaas => {
            info!("Using Asaas payment backend at {}", config.functions_url());
            Ok(Arc::new(AsaasGateway::new(config)?))
        }
        PaymentProvider::MercadoPago => {
            info!("Using Mercado Pago payment backend at {}", config.functions_url());
            Ok(Arc::new(MercadoPagoGateway::new(config)?))
        }
    }
}
