//! Wallet identity and balance snapshot model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{CrocialError, Result};

/// A hex-encoded account address on the wallet provider's chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses an address, requiring the `0x` prefix and hex payload.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let hex = raw
            .strip_prefix("0x")
            .ok_or_else(|| CrocialError::validation("wallet address must start with 0x"))?;
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CrocialError::validation(format!(
                "wallet address is not valid hex: {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stablecoin currency codes supported by the payment collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
pub enum CurrencyCode {
    /// USD-pegged stablecoin
    USD,
    /// EUR-pegged stablecoin
    EUR,
}

/// Native-currency balance in wei, with decimal rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeBalance {
    wei: u128,
}

const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

impl NativeBalance {
    pub fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    /// Parses a JSON-RPC quantity (`0x...` hex string) into a balance.
    pub fn from_rpc_quantity(quantity: &str) -> Result<Self> {
        let hex = quantity.strip_prefix("0x").ok_or_else(|| {
            CrocialError::bad_shape(format!("balance quantity missing 0x prefix: {quantity}"))
        })?;
        let wei = u128::from_str_radix(hex, 16).map_err(|e| {
            CrocialError::bad_shape(format!("balance quantity is not hex: {quantity} ({e})"))
        })?;
        Ok(Self { wei })
    }

    pub fn wei(&self) -> u128 {
        self.wei
    }

    /// Renders the balance in whole ETH with trailing zeros trimmed,
    /// e.g. `1500000000000000000` wei -> `"1.5"`.
    pub fn format_eth(&self) -> String {
        let whole = self.wei / WEI_PER_ETH;
        let frac = self.wei % WEI_PER_ETH;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:018}");
        let frac = frac.trim_end_matches('0');
        format!("{whole}.{frac}")
    }
}

/// A point-in-time view of the linked wallet's balances.
///
/// Only valid for the session's currently linked wallet; a wallet change
/// invalidates the snapshot and requires a fresh fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: WalletAddress,
    pub native_balance: NativeBalance,
    /// Stablecoin holdings as decimal amount strings keyed by currency
    pub stablecoins: BTreeMap<CurrencyCode, String>,
}

impl WalletSnapshot {
    /// Whether this snapshot still describes the given linked wallet.
    pub fn is_for(&self, address: &WalletAddress) -> bool {
        &self.address == address
    }
}
