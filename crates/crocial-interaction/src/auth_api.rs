//! Clerk-style auth provider client.
//!
//! Session lookup and best-effort sign-out against the auth provider's
//! backend API. Configuration priority: ~/.config/crocial/secret.json >
//! environment variables.

use async_trait::async_trait;
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::AuthGateway;
use crocial_core::session::Session;
use crocial_core::wallet::WalletAddress;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use crate::config;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.clerk.com";

/// Auth gateway backed by the Clerk HTTP API.
#[derive(Clone)]
pub struct ClerkAuthApi {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl ClerkAuthApi {
    /// Creates a new client with the provided secret key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Loads configuration from secret.json or the `CLERK_SECRET_KEY`
    /// environment variable.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(clerk) = &secret.clerk {
                let mut api = Self::new(clerk.secret_key.clone());
                if let Some(base_url) = &clerk.base_url {
                    api.base_url = base_url.clone();
                }
                return Ok(api);
            }
        }

        let secret_key = env::var("CLERK_SECRET_KEY").map_err(|_| {
            CrocialError::auth(
                "CLERK_SECRET_KEY not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(secret_key))
    }

    /// Overrides the base URL after construction.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    user: Option<UserDto>,
}

#[derive(Deserialize)]
struct UserDto {
    id: String,
    full_name: Option<String>,
    username: Option<String>,
    primary_web3_wallet: Option<WalletDto>,
}

#[derive(Deserialize)]
struct WalletDto {
    web3_wallet: String,
}

#[derive(Serialize)]
struct SignOutRequest<'a> {
    redirect_url: &'a str,
}

fn session_from_dto(user: UserDto) -> Result<Session> {
    let wallet = user
        .primary_web3_wallet
        .map(|w| {
            WalletAddress::parse(&w.web3_wallet).map_err(|_| {
                CrocialError::bad_shape(format!(
                    "auth provider returned malformed wallet address: {}",
                    w.web3_wallet
                ))
            })
        })
        .transpose()?;

    let display_name = user
        .full_name
        .filter(|n| !n.is_empty())
        .or(user.username)
        .unwrap_or_default();

    Ok(Session {
        user_id: user.id,
        display_name,
        wallet,
    })
}

#[async_trait]
impl AuthGateway for ClerkAuthApi {
    async fn current_session(&self) -> Result<Option<Session>> {
        let response = self
            .client
            .get(format!("{}/v1/me", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await;

        let response = http::ensure_success("auth session lookup", response).await?;
        let parsed: SessionResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("auth session response: {err}"))
        })?;

        parsed.user.map(session_from_dto).transpose()
    }

    async fn sign_out(&self, redirect_target: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/v1/sign_out", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&SignOutRequest {
                redirect_url: redirect_target,
            })
            .send()
            .await;

        http::ensure_success("auth sign-out", response).await?;
        Ok(())
    }
}
