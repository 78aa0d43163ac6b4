//! Signed-in identity context.

use serde::{Deserialize, Serialize};

use crate::wallet::WalletAddress;

/// The authenticated identity for the current user.
///
/// Produced by the auth collaborator at sign-in and read-only to the
/// application; screens hold it, never mutate it. Dropped on sign-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier assigned by the auth provider
    pub user_id: String,
    /// Display name shown next to posts and messages
    pub display_name: String,
    /// Primary linked Web3 wallet, if the user has connected one
    pub wallet: Option<WalletAddress>,
}

impl Session {
    /// The author label used on posts: display name, falling back to the
    /// provider id when the profile carries no name.
    pub fn author_label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.user_id
        } else {
            &self.display_name
        }
    }
}
