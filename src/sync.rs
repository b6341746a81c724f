use crate::store::MessageStore;
use crate::types::message::{ChatId, Message};
use log::{debug, warn};

/// Where the open conversation stands between the pull snapshot and the push
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Ready,
}

/// What became of one pushed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended to the store.
    Applied,
    /// Held until the snapshot installs.
    Buffered,
    /// Already present under the same identity.
    Duplicate,
    /// Tagged with some other conversation's identity.
    WrongChat,
}

/// Reconciles the initial pull snapshot with the push stream for one
/// conversation.
///
/// Pushes that arrive before the snapshot lands are buffered in arrival order
/// and replayed through the store's dedup path the moment it does, so nothing
/// is lost and nothing applies twice. Switching conversations drops the whole
/// machine, buffer included; a late event for the abandoned conversation then
/// has nothing left to mutate.
#[derive(Debug)]
pub struct ChatSync {
    chat_id: ChatId,
    state: SyncState,
    pending: Vec<Message>,
    store: MessageStore,
}

impl ChatSync {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            store: MessageStore::new(chat_id.clone()),
            chat_id,
            state: SyncState::Idle,
            pending: Vec::new(),
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    /// Marks the pull as outstanding. Pushes from here on are buffered until
    /// [`ChatSync::install_snapshot`]. Re-entering from `Ready` restarts the
    /// fetch over the existing store.
    pub fn begin_fetch(&mut self) {
        self.state = SyncState::Fetching;
    }

    /// Routes one pushed message. Events while `Idle` are buffered like events
    /// while `Fetching`: the snapshot a caller is about to request must still
    /// logically precede them.
    pub fn push(&mut self, message: Message) -> PushOutcome {
        if message.chat_id != self.chat_id {
            debug!(
                "Dropping pushed message {} for chat {} (open chat is {})",
                message.id, message.chat_id, self.chat_id
            );
            return PushOutcome::WrongChat;
        }
        match self.state {
            SyncState::Idle | SyncState::Fetching => {
                self.pending.push(message);
                PushOutcome::Buffered
            }
            SyncState::Ready => {
                if self.store.append(message) {
                    PushOutcome::Applied
                } else {
                    PushOutcome::Duplicate
                }
            }
        }
    }

    /// Installs the pull snapshot, then replays everything buffered while it
    /// was outstanding. Replay goes through the dedup path, so a message both
    /// pushed and present in the snapshot lands exactly once. Returns how many
    /// buffered messages survived replay.
    pub fn install_snapshot(&mut self, messages: Vec<Message>) -> usize {
        if self.state == SyncState::Ready {
            warn!("Snapshot installed over a ready store for chat {}", self.chat_id);
        }
        self.store.replace_snapshot(messages);
        let pending = std::mem::take(&mut self.pending);
        let mut replayed = 0;
        for message in pending {
            if self.store.append(message) {
                replayed += 1;
            }
        }
        self.state = SyncState::Ready;
        replayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::message_at;

    #[test]
    fn snapshot_then_replay_applies_each_message_once() {
        let mut sync = ChatSync::new("c1".to_string());
        sync.begin_fetch();

        // X and Y arrive over the push channel while the fetch is outstanding.
        assert_eq!(
            sync.push(message_at("x", "c1", "u1", 20)),
            PushOutcome::Buffered
        );
        assert_eq!(
            sync.push(message_at("y", "c1", "u1", 30)),
            PushOutcome::Buffered
        );

        // The snapshot already includes X but not Y.
        let replayed = sync.install_snapshot(vec![
            message_at("w", "c1", "u1", 10),
            message_at("x", "c1", "u1", 20),
        ]);
        assert_eq!(replayed, 1);
        assert_eq!(sync.state(), SyncState::Ready);

        let ids: Vec<_> = sync.store().list().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["w", "x", "y"]);
    }

    #[test]
    fn pushes_while_idle_are_buffered_too() {
        let mut sync = ChatSync::new("c1".to_string());
        assert_eq!(
            sync.push(message_at("m1", "c1", "u1", 10)),
            PushOutcome::Buffered
        );
        sync.begin_fetch();
        sync.install_snapshot(Vec::new());
        assert_eq!(sync.store().len(), 1);
    }

    #[test]
    fn ready_pushes_apply_directly_and_dedup() {
        let mut sync = ChatSync::new("c1".to_string());
        sync.begin_fetch();
        sync.install_snapshot(Vec::new());

        assert_eq!(
            sync.push(message_at("m1", "c1", "u1", 10)),
            PushOutcome::Applied
        );
        assert_eq!(
            sync.push(message_at("m1", "c1", "u1", 10)),
            PushOutcome::Duplicate
        );
        assert_eq!(sync.store().len(), 1);
    }

    #[test]
    fn foreign_chat_events_are_dropped() {
        let mut sync = ChatSync::new("c1".to_string());
        sync.begin_fetch();
        assert_eq!(
            sync.push(message_at("m1", "other", "u1", 10)),
            PushOutcome::WrongChat
        );
        assert_eq!(sync.install_snapshot(Vec::new()), 0);
        assert!(sync.store().is_empty());
    }
}
