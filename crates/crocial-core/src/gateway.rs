//! Boundary traits for the external collaborators.
//!
//! One trait per collaborator, one network operation per method. Responses
//! are parsed and validated by the implementation before they enter
//! application state; a shape mismatch is a remote rejection, not a panic.
//!
//! Gateways never retry on their own. Some operations (balance fetch) are
//! always safe to re-issue, others (payment submission) are only safe with
//! the caller's idempotency key, so retry policy belongs to the screen.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::payment::{PaymentReceipt, PaymentRequest};
use crate::post::{ContentPost, PostDraft, PostId};
use crate::session::Session;
use crate::wallet::{CurrencyCode, NativeBalance, WalletAddress};

/// Auth provider: session lookup and sign-out.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Returns the current session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Ends the session. Best-effort: callers drop local session state even
    /// if this fails.
    async fn sign_out(&self, redirect_target: &str) -> Result<()>;
}

/// Wallet provider: native-currency balance lookup.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn native_balance(&self, address: &WalletAddress) -> Result<NativeBalance>;
}

/// Stablecoin balance service.
#[async_trait]
pub trait StablecoinGateway: Send + Sync {
    /// Returns currency -> decimal amount for the given wallet.
    async fn balances(&self, address: &WalletAddress) -> Result<BTreeMap<CurrencyCode, String>>;
}

/// Payment service.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits a transfer, forwarding the request's idempotency key so a
    /// retry after a timeout cannot execute twice remotely.
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt>;
}

/// A reference to a generated media asset (URL on the inference provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(pub String);

/// Image generation parameters, defaulted to the studio's house style.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationParams {
    pub num_outputs: u32,
    pub aspect_ratio: String,
    pub output_format: String,
    pub go_fast: bool,
    pub megapixels: String,
}

impl Default for ImageGenerationParams {
    fn default() -> Self {
        Self {
            num_outputs: 1,
            aspect_ratio: "1:1".to_string(),
            output_format: "png".to_string(),
            go_fast: true,
            megapixels: "1".to_string(),
        }
    }
}

/// Image-to-video parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoGenerationParams {
    pub prompt: String,
    pub max_frames: u32,
    pub guidance_scale: u32,
    pub num_inference_steps: u32,
}

impl Default for VideoGenerationParams {
    fn default() -> Self {
        Self {
            prompt: "Dynamic video from generated image".to_string(),
            max_frames: 16,
            guidance_scale: 9,
            num_inference_steps: 50,
        }
    }
}

/// Inference service: prompt-to-image and image-to-video.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Generates one or more images for the prompt. Implementations must
    /// report a provider response with zero outputs as an empty-result
    /// error, never as success.
    async fn generate_image(
        &self,
        prompt: &str,
        params: &ImageGenerationParams,
    ) -> Result<Vec<MediaRef>>;

    /// Generates a video from a previously generated image.
    async fn generate_video(
        &self,
        image: &MediaRef,
        params: &VideoGenerationParams,
    ) -> Result<MediaRef>;
}

/// Content service: the post feed.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Lists posts ordered by creation time descending.
    async fn list_posts(&self) -> Result<Vec<ContentPost>>;

    /// Persists a draft (uploading its image, if any) and returns the
    /// authoritative post with its service-assigned id.
    async fn create_post(&self, author: &str, draft: &PostDraft) -> Result<ContentPost>;

    /// Increments a post's upvote count remotely, returning the new count.
    async fn increment_upvote(&self, id: &PostId) -> Result<u64>;
}

/// Messaging service.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Lists the session's conversations with their messages.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Sends a message to a peer, returning the confirmed message.
    async fn send_message(&self, peer: &str, body: &str) -> Result<Message>;
}
