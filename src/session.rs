use crate::types::message::ChatId;

/// Monotonically increasing identifier for one connection attempt. Every task
/// spawned for a connection carries the id it was started under; state-mutating
/// callbacks are rejected when the id no longer matches the live session, so a
/// reconnect cleanly orphans everything the previous connection left running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// Transport is up and the authenticating join frame went out.
    Joined,
}

/// The one live connection session. There is never more than one of these per
/// client; reconnecting replaces it wholesale under a fresh [`SessionId`].
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    room: Option<ChatId>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId(0),
            state: SessionState::Disconnected,
            room: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The chat room joined on the push channel, if any.
    pub fn room(&self) -> Option<&ChatId> {
        self.room.as_ref()
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    /// Whether an event tagged with `id` may still mutate state.
    pub fn is_current(&self, id: SessionId) -> bool {
        self.id == id && self.state != SessionState::Disconnected
    }

    /// Starts a new connection attempt, superseding whatever came before.
    /// Returns the fresh id that all tasks of this attempt must carry.
    pub fn begin_connect(&mut self) -> SessionId {
        self.id = SessionId(self.id.0 + 1);
        self.state = SessionState::Connecting;
        self.room = None;
        self.id
    }

    pub fn mark_joined(&mut self) {
        self.state = SessionState::Joined;
    }

    pub fn set_room(&mut self, chat_id: ChatId) {
        self.room = Some(chat_id);
    }

    /// Idempotent: tearing down an already-disconnected session changes
    /// nothing.
    pub fn disconnect(&mut self) {
        self.state = SessionState::Disconnected;
        self.room = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
