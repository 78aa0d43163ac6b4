//! HTTP gateway implementations for Crocial's external collaborators.
//!
//! Each module wraps exactly one provider behind the corresponding
//! `crocial-core` gateway trait: responses are parsed and validated here,
//! and every failure is classified into the shared error taxonomy before it
//! reaches application state. No client in this crate retries on its own.

pub mod auth_api;
pub mod circle_api;
pub mod config;
mod http;
pub mod content_api;
pub mod messaging_api;
pub mod replicate_api;
pub mod wallet_rpc;

pub use auth_api::ClerkAuthApi;
pub use circle_api::CircleApi;
pub use content_api::SupabaseContentApi;
pub use messaging_api::XmtpGatewayApi;
pub use replicate_api::ReplicateApi;
pub use wallet_rpc::EthereumRpcApi;
