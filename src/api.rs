use crate::net::{HttpClient, HttpRequest};
use crate::types::chat::RawChat;
use crate::types::message::{ChatId, RawMessage};
use crate::types::user::{Contact, UserId};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] anyhow::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("bad response body: {0}")]
    Body(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

/// Typed pull-fetch API. Every call carries the bearer credential; raw wire
/// shapes come back untouched and are normalized by the caller.
pub struct RestApi {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl RestApi {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    fn authorized(request: HttpRequest, token: &str) -> HttpRequest {
        request.with_header("Authorization", format!("Bearer {token}"))
    }

    fn ok(status: u16) -> Result<(), ApiError> {
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(ApiError::Status(status))
        }
    }

    /// `GET /api/messages/{chatId}` — the conversation snapshot, oldest first.
    pub async fn fetch_messages(
        &self,
        token: &str,
        chat_id: &ChatId,
    ) -> Result<Vec<RawMessage>, ApiError> {
        let url = format!(
            "{}/api/messages/{}",
            self.base_url,
            urlencoding::encode(chat_id)
        );
        let response = self
            .http
            .execute(Self::authorized(HttpRequest::get(url), token))
            .await?;
        Self::ok(response.status_code)?;
        let envelope: MessagesEnvelope = serde_json::from_slice(&response.body)?;
        debug!(
            "Fetched {} messages for chat {chat_id}",
            envelope.messages.len()
        );
        Ok(envelope.messages)
    }

    /// `GET /api/chats` — the authoritative conversation list.
    pub async fn fetch_chats(&self, token: &str) -> Result<Vec<RawChat>, ApiError> {
        let url = format!("{}/api/chats", self.base_url);
        let response = self
            .http
            .execute(
                Self::authorized(HttpRequest::get(url), token)
                    .with_header("Cache-Control", "no-cache"),
            )
            .await?;
        Self::ok(response.status_code)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// `GET /api/users` — the peer directory used to start a conversation.
    pub async fn fetch_users(&self, token: &str) -> Result<Vec<Contact>, ApiError> {
        let url = format!("{}/api/users", self.base_url);
        let response = self
            .http
            .execute(Self::authorized(HttpRequest::get(url), token))
            .await?;
        Self::ok(response.status_code)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// `POST /api/chats/create` — opens a conversation with `receiver` and
    /// returns its summary.
    pub async fn create_chat(&self, token: &str, receiver: &UserId) -> Result<RawChat, ApiError> {
        let url = format!("{}/api/chats/create", self.base_url);
        let body = serde_json::to_vec(&json!({ "receiverId": receiver.as_str() }))?;
        let response = self
            .http
            .execute(
                Self::authorized(HttpRequest::post(url), token)
                    .with_header("Content-Type", "application/json")
                    .with_body(body),
            )
            .await?;
        Self::ok(response.status_code)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// `POST /api/messages/read` — fire-and-forget from the core's view; the
    /// caller spawns it and only logs a failure.
    pub async fn mark_read(&self, token: &str, chat_id: &ChatId) -> Result<(), ApiError> {
        let url = format!("{}/api/messages/read", self.base_url);
        let body = serde_json::to_vec(&json!({ "chatId": chat_id }))?;
        let response = self
            .http
            .execute(
                Self::authorized(HttpRequest::post(url), token)
                    .with_header("Content-Type", "application/json")
                    .with_body(body),
            )
            .await?;
        Self::ok(response.status_code)
    }
}
