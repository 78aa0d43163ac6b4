//! Messages screen use case.
//!
//! Loads conversations (each displayed oldest-first) and sends messages.
//! A confirmed send is appended to its loaded conversation; while the send
//! is in flight the composer's loading state covers the latency.

use std::sync::Arc;

use crocial_core::controller::{ViewSnapshot, ViewState};
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::MessagingGateway;
use crocial_core::message::{Conversation, Message};
use tokio::sync::RwLock;

pub struct MessagesScreen {
    messaging: Arc<dyn MessagingGateway>,
    conversations: RwLock<ViewState<Vec<Conversation>>>,
    send: RwLock<ViewState<Message>>,
}

impl MessagesScreen {
    pub fn new(messaging: Arc<dyn MessagingGateway>) -> Self {
        Self {
            messaging,
            conversations: RwLock::new(ViewState::new()),
            send: RwLock::new(ViewState::new()),
        }
    }

    pub async fn conversations(&self) -> ViewSnapshot<Vec<Conversation>> {
        self.conversations.read().await.snapshot()
    }

    pub async fn send_state(&self) -> ViewSnapshot<Message> {
        self.send.read().await.snapshot()
    }

    /// Loads all conversations. On failure previously loaded conversations
    /// stay visible.
    pub async fn load(&self) {
        let Some(token) = self.conversations.write().await.begin() else {
            return;
        };

        let outcome = self.messaging.list_conversations().await;

        let mut conversations = self.conversations.write().await;
        match outcome {
            Ok(loaded) => {
                conversations.succeed(&token, loaded);
            }
            Err(err) => {
                tracing::warn!(target: "messages", "conversation load failed: {err}");
                conversations.fail(&token, err);
            }
        }
    }

    /// Sends a message and appends the confirmed copy to its conversation.
    ///
    /// # Errors
    ///
    /// An empty body fails validation locally and is never dispatched.
    pub async fn send(&self, peer: &str, body: &str) -> Result<Message> {
        if body.trim().is_empty() {
            return Err(CrocialError::validation("message body must not be empty"));
        }

        let Some(token) = self.send.write().await.begin() else {
            return Err(CrocialError::validation("a message is already being sent"));
        };

        let outcome = self.messaging.send_message(peer, body).await;

        match outcome {
            Ok(message) => {
                {
                    let mut conversations = self.conversations.write().await;
                    if let Some(loaded) = conversations.result_mut() {
                        match loaded.iter_mut().find(|c| c.peer == message.peer) {
                            Some(conversation) => conversation.append(message.clone()),
                            None => loaded.push(Conversation {
                                peer: message.peer.clone(),
                                messages: vec![message.clone()],
                            }),
                        }
                    }
                }
                self.send.write().await.succeed(&token, message.clone());
                Ok(message)
            }
            Err(err) => {
                tracing::warn!(target: "messages", "send failed: {err}");
                self.send.write().await.fail(&token, err.clone());
                Err(err)
            }
        }
    }
}
