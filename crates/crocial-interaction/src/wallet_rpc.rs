//! Ethereum JSON-RPC wallet provider client.
//!
//! One operation: `eth_getBalance` for the session's linked wallet.

use async_trait::async_trait;
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::WalletGateway;
use crocial_core::wallet::{NativeBalance, WalletAddress};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use crate::config;
use crate::http;

/// Wallet gateway backed by an Ethereum JSON-RPC endpoint.
#[derive(Clone)]
pub struct EthereumRpcApi {
    client: Client,
    endpoint: String,
}

impl EthereumRpcApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Loads the endpoint from secret.json or `ETH_RPC_URL`.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(rpc) = &secret.wallet_rpc {
                return Ok(Self::new(rpc.endpoint.clone()));
            }
        }

        let endpoint = env::var("ETH_RPC_URL").map_err(|_| {
            CrocialError::internal(
                "ETH_RPC_URL not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(endpoint))
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: (&'a str, &'static str),
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[async_trait]
impl WalletGateway for EthereumRpcApi {
    async fn native_balance(&self, address: &WalletAddress) -> Result<NativeBalance> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_getBalance",
            params: (address.as_str(), "latest"),
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await;
        let response = http::ensure_success("wallet balance", response).await?;
        let parsed: RpcResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("wallet balance response: {err}"))
        })?;

        if let Some(error) = parsed.error {
            return Err(CrocialError::bad_shape(format!(
                "wallet provider error {}: {}",
                error.code, error.message
            )));
        }

        let quantity = parsed.result.ok_or_else(|| {
            CrocialError::bad_shape("wallet balance response missing result")
        })?;
        NativeBalance::from_rpc_quantity(&quantity)
    }
}
