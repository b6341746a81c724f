use crate::types::message::{ChatId, RawMessage};
use serde::{Deserialize, Serialize};

/// Calls the client emits over the push channel. Serialized as
/// `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Authenticate the channel with the bearer credential.
    Join(String),
    /// Subscribe to one conversation's room.
    JoinChat(ChatId),
    SendMessage {
        #[serde(rename = "chatId")]
        chat_id: ChatId,
        text: String,
    },
}

impl ClientFrame {
    pub fn to_bytes(&self) -> super::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Traffic the server pushes. Only `new-message` matters to the core; anything
/// else folds into `Unknown` and is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerFrame {
    NewMessage(Box<RawMessage>),
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    pub fn parse(data: &[u8]) -> super::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_use_the_channel_event_names() {
        let join = ClientFrame::Join("tok".into());
        assert_eq!(
            serde_json::to_string(&join).unwrap(),
            r#"{"event":"join","data":"tok"}"#
        );

        let room = ClientFrame::JoinChat("c1".into());
        assert_eq!(
            serde_json::to_string(&room).unwrap(),
            r#"{"event":"join-chat","data":"c1"}"#
        );

        let send = ClientFrame::SendMessage {
            chat_id: "c1".into(),
            text: "hi".into(),
        };
        assert_eq!(
            serde_json::to_string(&send).unwrap(),
            r#"{"event":"send-message","data":{"chatId":"c1","text":"hi"}}"#
        );
    }

    #[test]
    fn new_message_frame_parses() {
        let frame = ServerFrame::parse(
            br#"{"event":"new-message",
                 "data":{"_id":"m1","chat":"c1","sender":"u1","text":"hi",
                         "createdAt":"2026-01-10T12:00:00Z"}}"#,
        )
        .unwrap();
        match frame {
            ServerFrame::NewMessage(raw) => {
                let msg = raw.normalize().unwrap();
                assert_eq!(msg.id, "m1");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_channel_traffic_is_ignored() {
        let frame = ServerFrame::parse(br#"{"event":"typing","data":{"chat":"c1"}}"#).unwrap();
        assert!(matches!(frame, ServerFrame::Unknown));
    }
}
