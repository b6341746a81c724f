use crate::types::message::{ChatId, Message, MessageId};
use crate::types::user::UserId;
use log::debug;
use std::collections::HashSet;

/// Ordered, identity-keyed collection of the open conversation's messages.
///
/// Ordering is ascending `created_at` with arrival order as the stable tiebreak
/// for equal timestamps. At most one entry per message id ever exists; a
/// duplicate append is an expected race, not an error, and is silently dropped.
#[derive(Debug)]
pub struct MessageStore {
    chat_id: ChatId,
    messages: Vec<Message>,
    seen: HashSet<MessageId>,
}

impl MessageStore {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            messages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Inserts at the sorted position; returns `false` for a duplicate id.
    /// Equal timestamps land after existing entries, which keeps arrival order.
    pub fn append(&mut self, message: Message) -> bool {
        if self.seen.contains(&message.id) {
            debug!(
                "Dropping duplicate message {} for chat {}",
                message.id, self.chat_id
            );
            return false;
        }
        self.seen.insert(message.id.clone());
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
        true
    }

    /// Installs a pull snapshot, discarding whatever was held before. The
    /// snapshot is sorted stably and deduplicated first-wins.
    pub fn replace_snapshot(&mut self, mut messages: Vec<Message>) {
        messages.sort_by_key(|m| m.created_at);
        self.seen.clear();
        messages.retain(|m| self.seen.insert(m.id.clone()));
        self.messages = messages;
    }

    /// Adds `participant` to the delivery set of every message they did not
    /// send. Never reorders.
    pub fn mark_delivered(&mut self, participant: &UserId) {
        for message in &mut self.messages {
            message.mark_delivered(participant);
        }
    }

    /// Adds `participant` to the read set of every message they did not send.
    pub fn mark_read(&mut self, participant: &UserId) {
        for message in &mut self.messages {
            message.mark_read(participant);
        }
    }

    pub fn list(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }
}
