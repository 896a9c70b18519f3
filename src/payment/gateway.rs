use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The one thing the core keeps from a processor order: its id. The
/// order's own state stays with the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Cannot reach payment processor at {0}")]
    Connection(String),

    #[error("Payment processor returned {status}: {body}")]
    Processor { status: u16, body: String },

    #[error("Failed to parse processor response: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Minimal surface the booking core needs from a payment processor.
///
/// `create_order` opens an order for an amount in the processor's minor
/// currency unit, tagged with a receipt reference (the appointment id)
/// for traceability.
pub trait PaymentGateway: Send + Sync {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, GatewayError>;
}

/// HTTP client for the hosted payment processor.
///
/// Blocking on purpose — callers in async context go through
/// `spawn_blocking`, matching how the rest of the service treats
/// blocking externals.
pub struct HttpGateway {
    base_url: String,
    account_key: String,
    api_secret: String,
    client: reqwest::blocking::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, account_key: &str, api_secret: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account_key: account_key.to_string(),
            api_secret: api_secret.to_string(),
            client,
        }
    }
}

/// Request body for the processor's order endpoint.
#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Response body from the processor's order endpoint.
#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
}

impl PaymentGateway for HttpGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = CreateOrderRequest {
            amount: amount_minor,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_key, Some(&self.api_secret))
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection(self.base_url.clone())
                } else {
                    GatewayError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Processor {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CreateOrderResponse = response
            .json()
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        Ok(PaymentOrder {
            order_id: parsed.id,
        })
    }
}

/// Scripted gateway for protocol tests: hands out sequential order ids
/// or fails every call, and records what was requested.
#[cfg(test)]
pub struct FakeGateway {
    fail: bool,
    calls: std::sync::Arc<std::sync::Mutex<Vec<(i64, String, String)>>>,
}

#[cfg(test)]
impl FakeGateway {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Default::default(),
        }
    }

    /// Handle onto the call log, usable after the gateway moves into an
    /// `Arc<dyn PaymentGateway>`.
    pub fn call_log(&self) -> std::sync::Arc<std::sync::Mutex<Vec<(i64, String, String)>>> {
        self.calls.clone()
    }
}

#[cfg(test)]
impl PaymentGateway for FakeGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, GatewayError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((amount_minor, currency.to_string(), receipt.to_string()));

        if self.fail {
            return Err(GatewayError::Processor {
                status: 502,
                body: "order rejected".into(),
            });
        }
        Ok(PaymentOrder {
            order_id: format!("order_{}", calls.len()),
        })
    }
}
