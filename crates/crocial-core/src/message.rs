//! Conversation and message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

/// One message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The peer wallet/identity this message belongs to
    pub peer: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub direction: Direction,
}

/// A conversation with one peer, displayed oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Restores the display invariant: messages ordered by timestamp
    /// ascending. Stable, so same-timestamp messages keep arrival order.
    pub fn sort_for_display(&mut self) {
        self.messages.sort_by_key(|m| m.sent_at);
    }

    /// Appends a confirmed message, keeping display order intact.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.sort_for_display();
    }
}
