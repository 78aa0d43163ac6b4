//! Dashboard screen use case.
//!
//! Owns the signed-in session plus three independent state slices: the
//! wallet balance snapshot, the payment submission, and the recent-messages
//! preview. Slices load in parallel where they are disjoint; each slice
//! enforces at-most-one in-flight operation of its own.

use std::sync::Arc;

use crocial_core::controller::{ViewSnapshot, ViewState};
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::{
    AuthGateway, MessagingGateway, PaymentGateway, StablecoinGateway, WalletGateway,
};
use crocial_core::message::Message;
use crocial_core::payment::{PaymentReceipt, PaymentRequest, PaymentStatus};
use crocial_core::session::Session;
use crocial_core::wallet::{CurrencyCode, WalletAddress, WalletSnapshot};
use tokio::sync::RwLock;

/// Number of recent messages shown in the dashboard preview.
const MESSAGE_PREVIEW_LIMIT: usize = 5;

pub struct DashboardScreen {
    auth: Arc<dyn AuthGateway>,
    wallet: Arc<dyn WalletGateway>,
    stablecoins: Arc<dyn StablecoinGateway>,
    payments: Arc<dyn PaymentGateway>,
    messaging: Arc<dyn MessagingGateway>,
    session: RwLock<Option<Session>>,
    balance: RwLock<ViewState<WalletSnapshot>>,
    payment: RwLock<ViewState<PaymentReceipt>>,
    message_preview: RwLock<ViewState<Vec<Message>>>,
    /// The in-progress logical payment, kept so a retry reuses its
    /// idempotency key instead of minting a new one
    pending_payment: RwLock<Option<PaymentRequest>>,
}

impl DashboardScreen {
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        wallet: Arc<dyn WalletGateway>,
        stablecoins: Arc<dyn StablecoinGateway>,
        payments: Arc<dyn PaymentGateway>,
        messaging: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            auth,
            wallet,
            stablecoins,
            payments,
            messaging,
            session: RwLock::new(None),
            balance: RwLock::new(ViewState::new()),
            payment: RwLock::new(ViewState::new()),
            message_preview: RwLock::new(ViewState::new()),
            pending_payment: RwLock::new(None),
        }
    }

    /// Loads the current session from the auth collaborator.
    ///
    /// Changing the linked wallet invalidates the balance snapshot.
    ///
    /// # Errors
    ///
    /// Returns an auth error when nobody is signed in; the caller redirects
    /// to the sign-in screen.
    pub async fn initialize(&self) -> Result<Session> {
        let incoming = self.auth.current_session().await?;

        let Some(incoming) = incoming else {
            *self.session.write().await = None;
            return Err(CrocialError::auth("not signed in"));
        };

        {
            let mut session = self.session.write().await;
            let wallet_changed =
                session.as_ref().map(|s| &s.wallet) != Some(&incoming.wallet);
            if wallet_changed {
                self.balance.write().await.reset();
            }
            *session = Some(incoming.clone());
        }

        tracing::info!(target: "dashboard", user_id = %incoming.user_id, "session loaded");
        Ok(incoming)
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Fetches native and stablecoin balances for the linked wallet in
    /// parallel and publishes them as one snapshot.
    ///
    /// A second call while one is in flight is a no-op.
    pub async fn refresh_wallet(&self) -> Result<()> {
        let address = self.linked_wallet().await?;

        let Some(token) = self.balance.write().await.begin() else {
            tracing::debug!(target: "dashboard", "balance refresh already in flight");
            return Ok(());
        };

        let (native, stablecoins) = tokio::join!(
            self.wallet.native_balance(&address),
            self.stablecoins.balances(&address),
        );

        let outcome = native.and_then(|native_balance| {
            stablecoins.map(|stablecoins| WalletSnapshot {
                address: address.clone(),
                native_balance,
                stablecoins,
            })
        });

        let mut balance = self.balance.write().await;
        match outcome {
            Ok(snapshot) => {
                balance.succeed(&token, snapshot);
            }
            Err(err) => {
                tracing::warn!(target: "dashboard", "balance refresh failed: {err}");
                balance.fail(&token, err);
            }
        }
        Ok(())
    }

    pub async fn balance(&self) -> ViewSnapshot<WalletSnapshot> {
        self.balance.read().await.snapshot()
    }

    /// Loads the most recent messages across conversations for the preview
    /// section. Independent of the balance slice; no mutual ordering.
    pub async fn load_message_preview(&self) {
        let Some(token) = self.message_preview.write().await.begin() else {
            return;
        };

        let outcome = self.messaging.list_conversations().await.map(|conversations| {
            let mut messages: Vec<Message> = conversations
                .into_iter()
                .flat_map(|c| c.messages)
                .collect();
            messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
            messages.truncate(MESSAGE_PREVIEW_LIMIT);
            messages
        });

        let mut preview = self.message_preview.write().await;
        match outcome {
            Ok(messages) => {
                preview.succeed(&token, messages);
            }
            Err(err) => {
                tracing::warn!(target: "dashboard", "message preview failed: {err}");
                preview.fail(&token, err);
            }
        }
    }

    pub async fn message_preview(&self) -> ViewSnapshot<Vec<Message>> {
        self.message_preview.read().await.snapshot()
    }

    /// Validates and submits a new stablecoin payment.
    ///
    /// The request (and its idempotency key) is remembered until the
    /// collaborator confirms, so [`Self::retry_payment`] cannot cause a
    /// duplicate transfer.
    ///
    /// # Errors
    ///
    /// Validation failures (bad amount, bad destination, no linked wallet,
    /// a payment already in flight) surface here and are never dispatched.
    pub async fn submit_payment(
        &self,
        amount: &str,
        currency: CurrencyCode,
        destination: &str,
    ) -> Result<()> {
        let source = self.linked_wallet().await?;
        let destination = WalletAddress::parse(destination)?;
        let request = PaymentRequest::new(amount, currency, destination, source)?;
        self.drive_payment(request).await
    }

    /// Re-submits the remembered payment with its original idempotency key.
    ///
    /// # Errors
    ///
    /// Returns a validation error when there is nothing to retry or the
    /// previous submission is still in flight.
    pub async fn retry_payment(&self) -> Result<()> {
        let request = self
            .pending_payment
            .read()
            .await
            .clone()
            .ok_or_else(|| CrocialError::validation("no payment to retry"))?;
        self.drive_payment(request).await
    }

    async fn drive_payment(&self, request: PaymentRequest) -> Result<()> {
        // A rejected re-entry is an error here, not a silent no-op: the
        // caller handed over money-moving input that will never dispatch.
        let Some(token) = self.payment.write().await.begin() else {
            tracing::debug!(target: "dashboard", "payment already in flight");
            return Err(CrocialError::validation("a payment is already in flight"));
        };
        // Remember the admitted request only; a rejected re-entry must not
        // replace the key of the submission still in flight.
        *self.pending_payment.write().await = Some(request.clone());

        tracing::info!(
            target: "dashboard",
            idempotency_key = %request.idempotency_key,
            "submitting payment"
        );
        let outcome = self.payments.submit(&request).await;

        let mut payment = self.payment.write().await;
        match outcome {
            Ok(receipt) => {
                if receipt.status == PaymentStatus::Confirmed {
                    // Terminal; a later submission is a new logical payment.
                    *self.pending_payment.write().await = None;
                }
                payment.succeed(&token, receipt);
            }
            Err(err) => {
                tracing::warn!(target: "dashboard", "payment failed: {err}");
                payment.fail(&token, err);
            }
        }
        Ok(())
    }

    pub async fn payment(&self) -> ViewSnapshot<PaymentReceipt> {
        self.payment.read().await.snapshot()
    }

    /// Ends the session. Best-effort remotely; local state is cleared even
    /// when the collaborator is unreachable.
    pub async fn sign_out(&self, redirect_target: &str) {
        if let Err(err) = self.auth.sign_out(redirect_target).await {
            tracing::warn!(target: "dashboard", "remote sign-out failed: {err}");
        }
        *self.session.write().await = None;
        *self.pending_payment.write().await = None;
        self.balance.write().await.reset();
        self.payment.write().await.reset();
        self.message_preview.write().await.reset();
    }

    async fn linked_wallet(&self) -> Result<WalletAddress> {
        let session = self.session.read().await;
        let session = session
            .as_ref()
            .ok_or_else(|| CrocialError::auth("not signed in"))?;
        session
            .wallet
            .clone()
            .ok_or_else(|| CrocialError::validation("no wallet connected"))
    }
}
