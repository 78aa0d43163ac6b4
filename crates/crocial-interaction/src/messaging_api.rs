//! XMTP gateway service client.
//!
//! The messaging transport itself is external; this client talks to the
//! gateway service that holds the XMTP identity, listing conversations and
//! sending messages on the session's behalf.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::MessagingGateway;
use crocial_core::message::{Conversation, Direction, Message};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use crate::config;
use crate::http;

/// Messaging gateway backed by an XMTP gateway service.
#[derive(Clone)]
pub struct XmtpGatewayApi {
    client: Client,
    base_url: String,
}

impl XmtpGatewayApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Loads the gateway URL from secret.json or `XMTP_GATEWAY_URL`.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(xmtp) = &secret.xmtp {
                return Ok(Self::new(xmtp.gateway_url.clone()));
            }
        }

        let base_url = env::var("XMTP_GATEWAY_URL").map_err(|_| {
            CrocialError::internal(
                "XMTP_GATEWAY_URL not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(base_url))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationDto {
    peer_address: String,
    messages: Vec<MessageDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDto {
    content: String,
    sent_at: DateTime<Utc>,
    direction: DirectionDto,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum DirectionDto {
    Sent,
    Received,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    peer_address: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    peer_address: String,
    content: String,
    sent_at: DateTime<Utc>,
}

fn conversation_from_dto(dto: ConversationDto) -> Conversation {
    let peer = dto.peer_address;
    let mut conversation = Conversation {
        messages: dto
            .messages
            .into_iter()
            .map(|m| Message {
                peer: peer.clone(),
                body: m.content,
                sent_at: m.sent_at,
                direction: match m.direction {
                    DirectionDto::Sent => Direction::Sent,
                    DirectionDto::Received => Direction::Received,
                },
            })
            .collect(),
        peer,
    };
    conversation.sort_for_display();
    conversation
}

#[async_trait]
impl MessagingGateway for XmtpGatewayApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let response = self
            .client
            .get(format!("{}/conversations", self.base_url))
            .send()
            .await;

        let response = http::ensure_success("conversation listing", response).await?;
        let dtos: Vec<ConversationDto> = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("conversation listing response: {err}"))
        })?;
        Ok(dtos.into_iter().map(conversation_from_dto).collect())
    }

    async fn send_message(&self, peer: &str, body: &str) -> Result<Message> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&SendMessageRequest {
                peer_address: peer,
                content: body,
            })
            .send()
            .await;

        let response = http::ensure_success("message send", response).await?;
        let parsed: SendMessageResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("message send response: {err}"))
        })?;

        Ok(Message {
            peer: parsed.peer_address,
            body: parsed.content,
            sent_at: parsed.sent_at,
            direction: Direction::Sent,
        })
    }
}
