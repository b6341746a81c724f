use crate::types::chat::ChatSummary;
use crate::types::events::ChatActivity;
use log::debug;
use std::collections::HashSet;

/// The ordered conversation list: most recently active first, ids unique.
///
/// Push activity only ever reorders and updates rows that already exist; a
/// brand-new conversation enters through [`ChatList::refresh`] with
/// authoritative data, never inferred from a stray push event.
#[derive(Debug, Default)]
pub struct ChatList {
    chats: Vec<ChatSummary>,
}

impl ChatList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list from an authoritative snapshot, establishing
    /// descending `updated_at` order and dropping duplicate ids first-wins.
    pub fn refresh(&mut self, mut chats: Vec<ChatSummary>) {
        let mut seen = HashSet::new();
        chats.retain(|c| seen.insert(c.id.clone()));
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.chats = chats;
    }

    /// Folds one push event into the list. A known conversation gets its
    /// `last_message`/`updated_at` refreshed and moves to the front, everything
    /// else keeping relative order. An unknown conversation is ignored.
    pub fn apply_activity(&mut self, activity: &ChatActivity) -> bool {
        let Some(at) = self.chats.iter().position(|c| c.id == activity.chat_id) else {
            debug!(
                "Ignoring activity for unknown chat {}; waiting for a list refresh",
                activity.chat_id
            );
            return false;
        };
        let mut chat = self.chats.remove(at);
        chat.updated_at = activity.message.created_at;
        chat.last_message = Some(activity.message.clone());
        self.chats.insert(0, chat);
        true
    }

    /// Case-insensitive substring match on the peer's display name. A blank
    /// query yields the whole list; the underlying list is never mutated, so
    /// the view restarts cleanly on every call.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a ChatSummary> {
        let needle = query.trim().to_lowercase();
        self.chats
            .iter()
            .filter(move |c| needle.is_empty() || c.other_user.name.to_lowercase().contains(&needle))
    }

    pub fn list(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn get(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
