use super::message::{ChatId, Message, RawMessage};
use super::user::{Contact, IdRef};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MalformedChat {
    #[error("chat carries no identity")]
    MissingId,
    #[error("chat carries no peer")]
    MissingPeer,
}

/// One row of the conversation list. Owned by the chat list reconciler, which
/// keeps the list sorted by `updated_at` descending.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub id: ChatId,
    pub other_user: Contact,
    pub last_message: Option<Message>,
    pub updated_at: DateTime<Utc>,
    pub unread_count: u32,
}

/// A chat summary as the list endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChat {
    #[serde(rename = "_id", default)]
    pub id: Option<IdRef>,
    #[serde(default)]
    pub other_user: Option<Contact>,
    #[serde(default)]
    pub last_message: Option<RawMessage>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
}

impl RawChat {
    /// A summary without an id or a peer cannot be rendered or keyed and is
    /// dropped. A malformed embedded last message degrades to `None` instead of
    /// taking the whole summary down with it.
    pub fn normalize(self) -> Result<ChatSummary, MalformedChat> {
        let id = self.id.ok_or(MalformedChat::MissingId)?.into_string();
        let other_user = self.other_user.ok_or(MalformedChat::MissingPeer)?;
        let last_message = self.last_message.and_then(|m| m.normalize().ok());
        let updated_at = self
            .updated_at
            .or_else(|| last_message.as_ref().map(|m| m.created_at))
            .unwrap_or_else(Utc::now);

        Ok(ChatSummary {
            id,
            other_user,
            last_message,
            updated_at,
            unread_count: self.unread_count,
        })
    }
}
