pub mod controller;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod generation;
pub mod message;
pub mod payment;
pub mod post;
pub mod session;
pub mod wallet;

// Re-export common error type
pub use error::{CrocialError, Result};
