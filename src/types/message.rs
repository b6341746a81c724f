use super::user::{IdRef, UserId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

pub type MessageId = String;
pub type ChatId = String;

/// Normalization failure: the record is unusable without these fields and is
/// dropped before it can reach the store.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("message carries no identity")]
    MissingId,
    #[error("message carries no conversation reference")]
    MissingChat,
    #[error("message carries no sender identity")]
    MissingSender,
}

/// Canonical in-memory message shape. Everything that enters the store, whether
/// from a pull snapshot or a push event, goes through [`RawMessage::normalize`]
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub delivered_to: HashSet<UserId>,
    pub read_by: HashSet<UserId>,
}

impl Message {
    /// Records a delivery receipt. A participant never receives their own
    /// message, and receipt sets only ever grow.
    pub fn mark_delivered(&mut self, participant: &UserId) {
        if &self.sender != participant {
            self.delivered_to.insert(participant.clone());
        }
    }

    /// Records a read receipt. Same self-exclusion rule as delivery.
    pub fn mark_read(&mut self, participant: &UserId) {
        if &self.sender != participant {
            self.read_by.insert(participant.clone());
        }
    }
}

/// A message as the REST API or the push channel delivers it. Identity fields
/// may arrive bare or as populated objects; timestamps are RFC 3339 strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(rename = "_id", default)]
    pub id: Option<IdRef>,
    #[serde(default, alias = "chatId")]
    pub chat: Option<IdRef>,
    #[serde(default)]
    pub sender: Option<IdRef>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_to: Vec<IdRef>,
    #[serde(default)]
    pub read_by: Vec<IdRef>,
}

impl RawMessage {
    /// Collapses the wire shape into the canonical one. Total for any record
    /// that carries its three identity fields; a missing `createdAt` falls back
    /// to the time of normalization.
    pub fn normalize(self) -> Result<Message, MalformedMessage> {
        let id = self.id.ok_or(MalformedMessage::MissingId)?.into_string();
        let chat_id = self.chat.ok_or(MalformedMessage::MissingChat)?.into_string();
        let sender = self
            .sender
            .ok_or(MalformedMessage::MissingSender)?
            .into_user_id();

        Ok(Message {
            id,
            chat_id,
            sender,
            text: self.text,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            delivered_to: self
                .delivered_to
                .into_iter()
                .map(IdRef::into_user_id)
                .collect(),
            read_by: self.read_by.into_iter().map(IdRef::into_user_id).collect(),
        })
    }
}
