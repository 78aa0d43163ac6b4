//! Composition root wiring the concrete provider clients into screens.
//!
//! Hosts construct one [`App`] per signed-in session and keep it for the
//! session's lifetime; the screens inside share nothing except the
//! collaborators they were wired with.

use std::sync::Arc;

use crocial_core::error::Result;
use crocial_interaction::{
    CircleApi, ClerkAuthApi, EthereumRpcApi, ReplicateApi, SupabaseContentApi, XmtpGatewayApi,
};

use crate::{DashboardScreen, MessagesScreen, SocialScreen, StudioScreen};

/// All screen use cases, wired against the real providers.
pub struct App {
    pub dashboard: DashboardScreen,
    pub social: SocialScreen,
    pub studio: StudioScreen,
    pub messages: MessagesScreen,
}

impl App {
    /// Builds every screen from provider credentials in the environment
    /// (secret file first, then process environment).
    ///
    /// # Errors
    ///
    /// Fails with a validation error naming the first missing credential.
    pub fn from_env() -> Result<Self> {
        let auth = Arc::new(ClerkAuthApi::try_from_env()?);
        let wallet = Arc::new(EthereumRpcApi::try_from_env()?);
        let circle = Arc::new(CircleApi::try_from_env()?);
        let inference = Arc::new(ReplicateApi::try_from_env()?);
        let content = Arc::new(SupabaseContentApi::try_from_env()?);
        let messaging = Arc::new(XmtpGatewayApi::try_from_env()?);

        tracing::info!(target: "bootstrap", "provider clients configured");

        Ok(Self {
            dashboard: DashboardScreen::new(
                auth,
                wallet,
                circle.clone(),
                circle,
                messaging.clone(),
            ),
            social: SocialScreen::new(content),
            studio: StudioScreen::new(inference),
            messages: MessagesScreen::new(messaging),
        })
    }
}
