//! Payment submission model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{CrocialError, Result};
use crate::wallet::{CurrencyCode, WalletAddress};

/// A stablecoin transfer request.
///
/// The idempotency key is generated exactly once, at construction. Retrying
/// the same logical submission must reuse this request object so the remote
/// side can deduplicate; building a new request means a new transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: String,
    pub currency: CurrencyCode,
    pub destination: WalletAddress,
    pub source_wallet: WalletAddress,
    pub idempotency_key: Uuid,
}

impl PaymentRequest {
    /// Validates inputs and mints the idempotency key for this submission.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive or non-decimal amount.
    pub fn new(
        amount: impl Into<String>,
        currency: CurrencyCode,
        destination: WalletAddress,
        source_wallet: WalletAddress,
    ) -> Result<Self> {
        let amount = amount.into();
        validate_amount(&amount)?;
        Ok(Self {
            amount,
            currency,
            destination,
            source_wallet,
            idempotency_key: Uuid::new_v4(),
        })
    }
}

fn validate_amount(amount: &str) -> Result<()> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(CrocialError::validation("payment amount is required"));
    }
    let mut parts = amount.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    let digits_ok = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits_ok(whole) || !frac.map_or(true, digits_ok) {
        return Err(CrocialError::validation(format!(
            "payment amount is not a decimal number: {amount}"
        )));
    }
    if whole.chars().all(|c| c == '0') && frac.map_or(true, |f| f.chars().all(|c| c == '0')) {
        return Err(CrocialError::validation("payment amount must be positive"));
    }
    Ok(())
}

/// Terminal status reported by the payment collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Confirmed,
    Pending,
    Failed,
}

/// The collaborator's answer to a payment submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub status: PaymentStatus,
    /// Remote payment id, when the collaborator assigned one
    pub payment_id: Option<String>,
}
