use crate::api::{ApiError, RestApi};
use crate::chatlist::ChatList;
use crate::config::Config;
use crate::net::{HttpClient, Transport, TransportEvent, TransportFactory};
use crate::receipt::ReceiptStatus;
use crate::session::{Session, SessionId, SessionState};
use crate::socket::{ClientFrame, ServerFrame, SocketError};
use crate::sync::{ChatSync, PushOutcome};
use crate::types::chat::ChatSummary;
use crate::types::events::{ChatActivity, Connected, Disconnected, EventBus};
use crate::types::message::{ChatId, Message, RawMessage};
use crate::types::user::{Contact, Credentials, UserId};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, mpsc};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no credential available")]
    AuthRequired,
    #[error("client is not connected")]
    NotConnected,
    #[error("client is already connecting")]
    AlreadyConnected,
    #[error("could not establish the push channel: {0}")]
    Connect(String),
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("malformed server payload: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Facade over the synchronization core: connection lifecycle, the open
/// conversation's store, and the chat list. All mutation funnels through here,
/// always behind a session relevance check.
pub struct Client {
    api: RestApi,
    transport_factory: Arc<dyn TransportFactory>,

    credentials: RwLock<Option<Credentials>>,
    session: Mutex<Session>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    is_connecting: AtomicBool,

    chat_sync: RwLock<Option<ChatSync>>,
    chat_list: RwLock<ChatList>,

    pub event_bus: EventBus,
}

impl Client {
    pub fn new(
        config: Config,
        transport_factory: Arc<dyn TransportFactory>,
        http: Arc<dyn HttpClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api: RestApi::new(http, config.api_base_url),
            transport_factory,
            credentials: RwLock::new(None),
            session: Mutex::new(Session::new()),
            transport: Mutex::new(None),
            is_connecting: AtomicBool::new(false),
            chat_sync: RwLock::new(None),
            chat_list: RwLock::new(ChatList::new()),
            event_bus: EventBus::new(),
        })
    }

    pub async fn set_credentials(&self, credentials: Credentials) {
        *self.credentials.write().await = Some(credentials);
    }

    pub async fn clear_credentials(&self) {
        *self.credentials.write().await = None;
    }

    /// The viewing participant, when signed in.
    pub async fn viewer(&self) -> Option<UserId> {
        self.credentials.read().await.as_ref().map(|c| c.user_id.clone())
    }

    async fn credentials(&self) -> Result<Credentials, ClientError> {
        self.credentials
            .read()
            .await
            .clone()
            .ok_or(ClientError::AuthRequired)
    }

    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    // ---- Connection lifecycle -------------------------------------------

    /// Establishes the push channel under a fresh session id and sends the
    /// authenticating join. Any prior transport is torn down first, so exactly
    /// one transport is live per session and leaked listeners cannot
    /// double-apply events.
    pub async fn connect(self: &Arc<Self>) -> Result<SessionId, ClientError> {
        let credentials = self.credentials().await?;
        if self.is_connecting.swap(true, Ordering::SeqCst) {
            return Err(ClientError::AlreadyConnected);
        }
        let result = self.connect_inner(credentials).await;
        self.is_connecting.store(false, Ordering::SeqCst);
        result
    }

    async fn connect_inner(
        self: &Arc<Self>,
        credentials: Credentials,
    ) -> Result<SessionId, ClientError> {
        if let Some(old) = self.transport.lock().await.take() {
            debug!("Tearing down superseded transport before reconnecting");
            old.disconnect().await;
        }
        let session_id = self.session.lock().await.begin_connect();

        let (transport, events) = self
            .transport_factory
            .create_transport()
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        *self.transport.lock().await = Some(transport.clone());

        // Authenticate the channel before anything else rides it.
        let join = ClientFrame::Join(credentials.token.clone()).to_bytes()?;
        if let Err(e) = transport.send(&join).await {
            *self.transport.lock().await = None;
            self.session.lock().await.disconnect();
            return Err(ClientError::Connect(e.to_string()));
        }
        self.session.lock().await.mark_joined();

        let client = self.clone();
        tokio::spawn(async move {
            client.event_loop(session_id, events).await;
        });

        info!("Push channel joined (session {})", session_id.0);
        self.event_bus
            .connected
            .send(Arc::new(Connected { session: session_id }))
            .ok();
        Ok(session_id)
    }

    /// Idempotent: disconnecting an already-disconnected client is a no-op.
    pub async fn disconnect(&self) {
        let transport = self.transport.lock().await.take();
        let mut session = self.session.lock().await;
        if transport.is_none() && session.state() == SessionState::Disconnected {
            return;
        }
        let session_id = session.id();
        session.disconnect();
        drop(session);

        if let Some(transport) = transport {
            transport.disconnect().await;
        }
        info!("Disconnected (session {})", session_id.0);
        self.event_bus
            .disconnected
            .send(Arc::new(Disconnected {
                session: session_id,
                expected: true,
            }))
            .ok();
    }

    /// Subscribes the channel to one conversation's room. Valid only once the
    /// session is joined; there is deliberately no queueing of early calls.
    pub async fn join_chat(&self, chat_id: &ChatId) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        if !session.is_joined() {
            return Err(ClientError::NotConnected);
        }
        let frame = ClientFrame::JoinChat(chat_id.clone()).to_bytes()?;
        self.send_frame(&frame).await?;
        session.set_room(chat_id.clone());
        Ok(())
    }

    /// Sends a message over the channel. The text is trimmed; an all-blank
    /// send is a no-op. Delivery back into the store happens when the server
    /// pushes the created message.
    pub async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if !self.session.lock().await.is_joined() {
            return Err(ClientError::NotConnected);
        }
        let frame = ClientFrame::SendMessage {
            chat_id: chat_id.clone(),
            text: text.to_string(),
        }
        .to_bytes()?;
        self.send_frame(&frame).await
    }

    async fn send_frame(&self, frame: &[u8]) -> Result<(), ClientError> {
        let guard = self.transport.lock().await;
        let transport = guard.as_ref().ok_or(ClientError::NotConnected)?;
        transport.send(frame).await?;
        Ok(())
    }

    // ---- Open conversation ----------------------------------------------

    /// Opens a conversation: resets the coordinator for its id, joins its
    /// room, pulls the snapshot, replays whatever the channel pushed while the
    /// fetch was outstanding, then fires the mark-read side effect.
    pub async fn open_chat(self: &Arc<Self>, chat_id: ChatId) -> Result<(), ClientError> {
        let credentials = self.credentials().await?;
        {
            let mut machine = ChatSync::new(chat_id.clone());
            machine.begin_fetch();
            *self.chat_sync.write().await = Some(machine);
        }
        self.join_chat(&chat_id).await?;

        let raw = self.api.fetch_messages(&credentials.token, &chat_id).await?;
        let mut messages = Vec::with_capacity(raw.len());
        for record in raw {
            match record.normalize() {
                Ok(message) => messages.push(message),
                Err(e) => warn!("Dropping malformed snapshot message: {e}"),
            }
        }

        let loaded = {
            let mut guard = self.chat_sync.write().await;
            match guard.as_mut() {
                // The user may have switched away while the fetch was in
                // flight; a stale snapshot must not land.
                Some(sync) if sync.chat_id() == &chat_id => {
                    let replayed = sync.install_snapshot(messages);
                    debug!(
                        "Chat {chat_id} ready: {} messages ({replayed} replayed from buffer)",
                        sync.store().len()
                    );
                    !sync.store().is_empty()
                }
                _ => {
                    debug!("Discarding snapshot for abandoned chat {chat_id}");
                    false
                }
            }
        };

        if loaded {
            let client = self.clone();
            tokio::spawn(async move {
                // Fire-and-forget: local state never rolls back on failure.
                if let Err(e) = client.api.mark_read(&credentials.token, &chat_id).await {
                    warn!("Mark-read for chat {chat_id} failed: {e}");
                }
            });
        }
        Ok(())
    }

    /// Abandons the open conversation. Anything still buffered for it is gone,
    /// so a late event is a guaranteed no-op.
    pub async fn close_chat(&self) {
        *self.chat_sync.write().await = None;
    }

    /// Ordered messages of the open conversation.
    pub async fn messages(&self) -> Vec<Message> {
        self.chat_sync
            .read()
            .await
            .as_ref()
            .map(|sync| sync.store().list().to_vec())
            .unwrap_or_default()
    }

    /// Receipt indicator of `message` for the signed-in viewer.
    pub async fn receipt_status(&self, message: &Message) -> Option<ReceiptStatus> {
        let viewer = self.viewer().await?;
        ReceiptStatus::resolve(message, &viewer)
    }

    // ---- Chat list -------------------------------------------------------

    /// Replaces the chat list from the authoritative endpoint.
    pub async fn refresh_chats(&self) -> Result<(), ClientError> {
        let credentials = self.credentials().await?;
        let raw = self.api.fetch_chats(&credentials.token).await?;
        let mut chats = Vec::with_capacity(raw.len());
        for record in raw {
            match record.normalize() {
                Ok(chat) => chats.push(chat),
                Err(e) => warn!("Dropping malformed chat summary: {e}"),
            }
        }
        self.chat_list.write().await.refresh(chats);
        Ok(())
    }

    pub async fn chats(&self) -> Vec<ChatSummary> {
        self.chat_list.read().await.list().to_vec()
    }

    pub async fn filter_chats(&self, query: &str) -> Vec<ChatSummary> {
        self.chat_list.read().await.filter(query).cloned().collect()
    }

    pub async fn fetch_users(&self) -> Result<Vec<Contact>, ClientError> {
        let credentials = self.credentials().await?;
        Ok(self.api.fetch_users(&credentials.token).await?)
    }

    /// Starts a conversation with `receiver` and returns its summary. The
    /// list itself picks the new row up on the next refresh.
    pub async fn create_chat(&self, receiver: &UserId) -> Result<ChatSummary, ClientError> {
        let credentials = self.credentials().await?;
        let raw = self.api.create_chat(&credentials.token, receiver).await?;
        raw.normalize()
            .map_err(|e| ClientError::Malformed(e.to_string()))
    }

    // ---- Push event handling --------------------------------------------

    async fn event_loop(
        self: Arc<Self>,
        session_id: SessionId,
        mut events: mpsc::Receiver<TransportEvent>,
    ) {
        while let Some(event) = events.recv().await {
            // A superseded session never mutates state, no matter what its
            // channel still delivers.
            if !self.session.lock().await.is_current(session_id) {
                debug!("Dropping event from superseded session {}", session_id.0);
                break;
            }
            match event {
                TransportEvent::Connected => {
                    debug!("Transport for session {} is up", session_id.0)
                }
                TransportEvent::FrameReceived(data) => self.handle_frame(&data).await,
                TransportEvent::Disconnected => {
                    let mut session = self.session.lock().await;
                    if session.is_current(session_id) {
                        session.disconnect();
                        drop(session);
                        *self.transport.lock().await = None;
                        warn!("Push channel lost (session {})", session_id.0);
                        self.event_bus
                            .disconnected
                            .send(Arc::new(Disconnected {
                                session: session_id,
                                expected: false,
                            }))
                            .ok();
                    }
                    break;
                }
            }
        }
        debug!("Event loop for session {} ended", session_id.0);
    }

    async fn handle_frame(self: &Arc<Self>, data: &[u8]) {
        let frame = match ServerFrame::parse(data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping undecodable frame: {e}");
                return;
            }
        };
        match frame {
            ServerFrame::NewMessage(raw) => self.handle_new_message(*raw).await,
            ServerFrame::Unknown => debug!("Ignoring unrecognized channel traffic"),
        }
    }

    async fn handle_new_message(self: &Arc<Self>, raw: RawMessage) {
        let message = match raw.normalize() {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping malformed pushed message: {e}");
                return;
            }
        };

        // The chat list reconciles every event, whether or not that
        // conversation is open.
        let activity = ChatActivity {
            chat_id: message.chat_id.clone(),
            message: message.clone(),
        };
        if self.chat_list.write().await.apply_activity(&activity) {
            self.event_bus.chat_activity.send(Arc::new(activity)).ok();
        }

        let accepted = {
            let mut guard = self.chat_sync.write().await;
            match guard.as_mut() {
                Some(sync) => sync.push(message.clone()) == PushOutcome::Applied,
                None => false,
            }
        };
        if accepted {
            self.event_bus.message.send(Arc::new(message)).ok();
        }
    }
}
