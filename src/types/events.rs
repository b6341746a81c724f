use super::message::{ChatId, Message};
use crate::session::SessionId;
use std::sync::Arc;
use tokio::sync::broadcast;

// The size of the broadcast channel buffer.
const CHANNEL_CAPACITY: usize = 100;

/// The push channel came up and the authenticating join was sent.
#[derive(Debug, Clone)]
pub struct Connected {
    pub session: SessionId,
}

/// The session was torn down, either deliberately or because the channel died.
#[derive(Debug, Clone)]
pub struct Disconnected {
    pub session: SessionId,
    pub expected: bool,
}

/// Activity on some conversation, open or not. This is what the chat list
/// reconciler consumes to reorder the list.
#[derive(Debug, Clone)]
pub struct ChatActivity {
    pub chat_id: ChatId,
    pub message: Message,
}

// Macro to generate EventBus fields and constructor
macro_rules! define_event_bus {
    ($(($field:ident, $type:ty)),* $(,)?) => {
        /// Typed event bus with a separate broadcast channel per event type.
        #[derive(Debug)]
        pub struct EventBus {
            $(
                pub $field: broadcast::Sender<$type>,
            )*
        }

        impl EventBus {
            pub fn new() -> Self {
                Self {
                    $(
                        $field: broadcast::channel(CHANNEL_CAPACITY).0,
                    )*
                }
            }
        }
    };
}

define_event_bus! {
    // Connection events
    (connected, Arc<Connected>),
    (disconnected, Arc<Disconnected>),

    // A pushed message accepted into the open conversation's store
    (message, Arc<Message>),
    // Any pushed message, keyed by conversation, after the list was reconciled
    (chat_activity, Arc<ChatActivity>),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
