//! Configuration file management for Crocial gateways.
//!
//! Supports reading secrets from `~/.config/crocial/secret.json`, with
//! environment variables as the fallback for each collaborator.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub clerk: Option<ClerkConfig>,
    #[serde(default)]
    pub wallet_rpc: Option<WalletRpcConfig>,
    #[serde(default)]
    pub circle: Option<CircleConfig>,
    #[serde(default)]
    pub replicate: Option<ReplicateConfig>,
    #[serde(default)]
    pub supabase: Option<SupabaseConfig>,
    #[serde(default)]
    pub xmtp: Option<XmtpConfig>,
}

/// Auth provider (Clerk backend API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkConfig {
    pub secret_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Ethereum JSON-RPC endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WalletRpcConfig {
    pub endpoint: String,
}

/// Circle payments API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CircleConfig {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Replicate inference API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    pub api_token: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Supabase content backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
}

/// XMTP gateway service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct XmtpConfig {
    pub gateway_url: String,
}

static SECRET: Lazy<Option<SecretConfig>> = Lazy::new(|| load_secret_config().ok());

/// Returns the cached secret configuration, if the file exists and parses.
pub fn secret_config() -> Option<&'static SecretConfig> {
    SECRET.as_ref()
}

/// Loads the secret configuration file from ~/.config/crocial/secret.json
pub fn load_secret_config() -> Result<SecretConfig, String> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(format!(
            "Configuration file not found at: {}",
            config_path.display()
        ));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        format!(
            "Failed to read configuration file at {}: {}",
            config_path.display(),
            e
        )
    })?;

    serde_json::from_str(&content).map_err(|e| {
        format!(
            "Failed to parse configuration file at {}: {}",
            config_path.display(),
            e
        )
    })
}

/// Returns the path to the configuration file: ~/.config/crocial/secret.json
fn get_config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "Could not determine home directory".to_string())?;
    Ok(home.join(".config").join("crocial").join("secret.json"))
}
