//! Asaas adapter.

use chrono::Utc;
use plan_core::{async_trait, PaymentError, PaymentGateway, PaymentIntent, PaymentProvider, PaymentStatus};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::PaymentGatewayConfig;
use crate::functions::{
    cents_to_amount, id_to_string, validate_create, CheckPaymentBody, CreatePaymentBody,
    FunctionResponse, FunctionsClient,
};
use crate::status::normalize_asaas;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    #[serde(default)]
    id: serde_json::Value,
    status: Option<String>,
    provider_reference: Option<String>,
    #[serde(alias = "pixCopiaECola")]
    invoice_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckPaymentResponse {
    status: String,
}

/// Payment gateway backed by Asaas charges.
pub struct AsaasGateway {
    client: FunctionsClient,
}

impl AsaasGateway {
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, PaymentError> {
        Ok(Self {
            client: FunctionsClient::new(config)?,
        })
    }
}

#[async_trait]
impl PaymentGateway for AsaasGateway {
    async fn create(
        &self,
        user_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.client.ensure_configured()?;
        validate_create(user_id, amount_cents, description)?;

        let body = CreatePaymentBody {
            user_id,
            amount: cents_to_amount(amount_cents),
            description,
        };

        let response: CreatePaymentResponse = match self.client.call("create-payment", &body).await? {
            FunctionResponse::Ok(response) => response,
            FunctionResponse::NotFound => {
                return Err(PaymentError::Configuration(
                    "create-payment function not found".to_string(),
                ))
            }
        };

        let external_id = id_to_string(&response.id).ok_or_else(|| PaymentError::Provider {
            provider: PaymentProvider::Asaas,
            status: 200,
            message: "response is missing the payment id".to_string(),
            raw: format!("{:?}", response),
        })?;

        let status = response
            .status
            .as_deref()
            .map(normalize_asaas)
            .unwrap_or(PaymentStatus::Pending);

        info!("Created Asaas payment {} for user {} ({} cents)", external_id, user_id, amount_cents);

        Ok(PaymentIntent {
            id: Uuid::new_v4(),
            external_id,
            user_id: user_id.to_string(),
            description: description.to_string(),
            status,
            amount_cents,
            provider: PaymentProvider::Asaas,
            checkout_reference: response.provider_reference.or(response.invoice_url),
            created_at: Utc::now(),
        })
    }

    async fn check_status(&self, external_id: &str) -> Result<PaymentStatus, PaymentError> {
        let body = CheckPaymentBody {
            payment_id: external_id,
        };

        match self.client.call::<_, CheckPaymentResponse>("check-payment", &body).await? {
            FunctionResponse::Ok(response) => Ok(normalize_asaas(&response.status)),
            FunctionResponse::NotFound => Err(PaymentError::NotFound(external_id.to_string())),
        }
    }

    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Asaas
    }
}
