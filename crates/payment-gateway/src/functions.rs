//! HTTP client for the `create-payment` / `check-payment` function pair
//! shared by both backends.

use std::time::Duration;

use plan_core::{PaymentError, PaymentProvider};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PaymentGatewayConfig, DEFAULT_HTTP_TIMEOUT_SECS};

/// Request body for `create-payment`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentBody<'a> {
    pub user_id: &'a str,
    /// Amount in major units (e.g. 19.9).
    pub amount: f64,
    pub description: &'a str,
}

/// Request body for `check-payment`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckPaymentBody<'a> {
    pub payment_id: &'a str,
}

/// Error body some functions return alongside a non-success status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

/// A raw function response.
pub(crate) enum FunctionResponse<T> {
    Ok(T),
    NotFound,
}

/// Thin wrapper around `reqwest` that knows the function URLs and token.
pub(crate) struct FunctionsClient {
    http: Client,
    base_url: String,
    token: String,
    provider: PaymentProvider,
}

impl FunctionsClient {
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: config.functions_url().trim_end_matches('/').to_string(),
            token: config.token().to_string(),
            provider: config.provider(),
        })
    }

    /// Fail fast when the credentials for this backend are missing.
    pub fn ensure_configured(&self) -> Result<(), PaymentError> {
        if self.base_url.is_empty() {
            return Err(PaymentError::Configuration(format!(
                "{} functions URL not set",
                self.provider
            )));
        }
        if self.token.is_empty() {
            return Err(PaymentError::Configuration(format!(
                "{} credentials not set",
                self.provider
            )));
        }
        Ok(())
    }

    /// POST `body` to `{base_url}/{function}` and decode the JSON answer.
    pub async fn call<B, T>(&self, function: &str, body: &B) -> Result<FunctionResponse<T>, PaymentError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.ensure_configured()?;

        let url = format!("{}/{}", self.base_url, function);
        debug!("Calling {} payment function: {}", self.provider, url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| PaymentError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(format!("Failed to read response: {}", e)))?;

        if status == StatusCode::NOT_FOUND {
            return Ok(FunctionResponse::NotFound);
        }

        if !status.is_success() {
            return Err(self.provider_error(status.as_u16(), text));
        }

        // Functions occasionally answer 200 with an error body.
        if let Ok(ErrorBody { error: Some(error), .. }) = serde_json::from_str::<ErrorBody>(&text) {
            if !error.is_null() {
                return Err(self.provider_error(status.as_u16(), text));
            }
        }

        serde_json::from_str(&text).map(FunctionResponse::Ok).map_err(|e| {
            PaymentError::Provider {
                provider: self.provider,
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
                raw: text,
            }
        })
    }

    fn provider_error(&self, status: u16, raw: String) -> PaymentError {
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .map(|value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| raw.clone());

        PaymentError::Provider {
            provider: self.provider,
            status,
            message,
            raw,
        }
    }
}

/// Check the caller's input before talking to any provider.
pub(crate) fn validate_create(
    user_id: &str,
    amount_cents: i64,
    description: &str,
) -> Result<(), PaymentError> {
    if user_id.trim().is_empty() {
        return Err(PaymentError::Validation("user id is required".to_string()));
    }
    if amount_cents <= 0 {
        return Err(PaymentError::Validation(format!(
            "amount must be positive, got {} cents",
            amount_cents
        )));
    }
    if description.trim().is_empty() {
        return Err(PaymentError::Validation("description is required".to_string()));
    }
    Ok(())
}

/// Convert minor units to the decimal amount the functions expect.
pub(crate) fn cents_to_amount(amount_cents: i64) -> f64 {
    amount_cents as f64 / 100.0
}

/// Provider ids arrive as strings or numbers depending on the backend.
pub(crate) fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_create() {
        assert!(validate_create("user-1", 1990, "Meal plan").is_ok());
        assert!(matches!(
            validate_create("", 1990, "Meal plan"),
            Err(PaymentError::Validation(_))
        ));
        assert!(matches!(
            validate_create("user-1", 0, "Meal plan"),
            Err(PaymentError::Validation(_))
        ));
        assert!(matches!(
            validate_create("user-1", 1990, "  "),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn test_cents_to_amount() {
        assert_eq!(cents_to_amount(1990), 19.9);
        assert_eq!(cents_to_amount(100), 1.0);
    }

    #[test]
    fn test_id_to_string() {
        assert_eq!(id_to_string(&serde_json::json!("pay_1")), Some("pay_1".to_string()));
        assert_eq!(id_to_string(&serde_json::json!(123456)), Some("123456".to_string()));
        assert_eq!(id_to_string(&serde_json::json!("")), None);
        assert_eq!(id_to_string(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_ensure_configured() {
        let client = FunctionsClient::new(&PaymentGatewayConfig::Asaas {
            functions_url: "https://fn.example".to_string(),
            api_key: String::new(),
        })
        .unwrap();
        assert!(matches!(client.ensure_configured(), Err(PaymentError::Configuration(_))));
    }
}
