//! Circle-style payments API client.
//!
//! Covers both stablecoin balance lookup and payment submission. The
//! submission body carries the caller's idempotency key verbatim so a retry
//! after a timeout cannot execute the transfer twice on the remote side.

use std::collections::BTreeMap;
use std::env;

use async_trait::async_trait;
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::{PaymentGateway, StablecoinGateway};
use crocial_core::payment::{PaymentReceipt, PaymentRequest, PaymentStatus};
use crocial_core::wallet::{CurrencyCode, WalletAddress};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.circle.com/v1/payments";

/// Stablecoin balance and payment gateway backed by the Circle API.
#[derive(Clone)]
pub struct CircleApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CircleApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Loads configuration from secret.json or `CIRCLE_API_KEY`.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(circle) = &secret.circle {
                let mut api = Self::new(circle.api_key.clone());
                if let Some(base_url) = &circle.base_url {
                    api.base_url = base_url.clone();
                }
                return Ok(api);
            }
        }

        let api_key = env::var("CIRCLE_API_KEY").map_err(|_| {
            CrocialError::auth(
                "CIRCLE_API_KEY not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(api_key))
    }

    /// Overrides the base URL after construction.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletBalancesResponse {
    usdc_balance: Option<serde_json::Number>,
    eurc_balance: Option<serde_json::Number>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPaymentRequest<'a> {
    amount: AmountDto<'a>,
    destination: DestinationDto<'a>,
    source: SourceDto<'a>,
    idempotency_key: String,
}

#[derive(Serialize)]
struct AmountDto<'a> {
    currency: String,
    amount: &'a str,
}

#[derive(Serialize)]
struct DestinationDto<'a> {
    address: &'a str,
}

#[derive(Serialize)]
struct SourceDto<'a> {
    r#type: &'static str,
    id: &'a str,
}

#[derive(Deserialize)]
struct SubmitPaymentResponse {
    status: String,
    id: Option<String>,
}

#[async_trait]
impl StablecoinGateway for CircleApi {
    async fn balances(&self, address: &WalletAddress) -> Result<BTreeMap<CurrencyCode, String>> {
        let response = self
            .client
            .get(format!("{}/wallets/{}", self.base_url, address))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        let response = http::ensure_success("stablecoin balances", response).await?;
        let parsed: WalletBalancesResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("stablecoin balances response: {err}"))
        })?;

        let mut balances = BTreeMap::new();
        if let Some(usdc) = parsed.usdc_balance {
            balances.insert(CurrencyCode::USD, usdc.to_string());
        }
        if let Some(eurc) = parsed.eurc_balance {
            balances.insert(CurrencyCode::EUR, eurc.to_string());
        }
        Ok(balances)
    }
}

#[async_trait]
impl PaymentGateway for CircleApi {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        let body = SubmitPaymentRequest {
            amount: AmountDto {
                currency: request.currency.to_string(),
                amount: &request.amount,
            },
            destination: DestinationDto {
                address: request.destination.as_str(),
            },
            source: SourceDto {
                r#type: "wallet",
                id: request.source_wallet.as_str(),
            },
            idempotency_key: request.idempotency_key.to_string(),
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        let response = http::ensure_success("payment submission", response).await?;
        let parsed: SubmitPaymentResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("payment submission response: {err}"))
        })?;

        let status: PaymentStatus = parsed.status.parse().map_err(|_| {
            CrocialError::bad_shape(format!(
                "payment service returned unknown status: {}",
                parsed.status
            ))
        })?;

        Ok(PaymentReceipt {
            status,
            payment_id: parsed.id,
        })
    }
}
