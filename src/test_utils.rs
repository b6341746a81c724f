use crate::net::{
    HttpClient, HttpRequest, HttpResponse, Transport, TransportEvent, TransportFactory,
};
use crate::types::chat::ChatSummary;
use crate::types::message::Message;
use crate::types::user::{Contact, UserId};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn message_at(id: &str, chat_id: &str, sender: &str, secs: i64) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender: UserId::new(sender),
        text: format!("text of {id}"),
        created_at: ts(secs),
        delivered_to: HashSet::new(),
        read_by: HashSet::new(),
    }
}

pub fn chat_at(id: &str, peer_name: &str, secs: i64) -> ChatSummary {
    ChatSummary {
        id: id.to_string(),
        other_user: Contact {
            id: UserId::new(format!("peer-of-{id}")),
            name: peer_name.to_string(),
            email: None,
        },
        last_message: None,
        updated_at: ts(secs),
        unread_count: 0,
    }
}

/// A transport that records outbound frames instead of sending them.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    async fn disconnect(&self) {}
}

/// A factory handing out [`MockTransport`]s and keeping the server-side ends,
/// so tests can push frames "from the server" into any session, including
/// superseded ones.
#[derive(Default)]
pub struct MockTransportFactory {
    handles: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
    transports: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Frames sent by the client on the `n`-th transport created.
    pub fn sent_frames(&self, n: usize) -> Vec<String> {
        self.transports.lock().unwrap()[n].sent.lock().unwrap().clone()
    }

    pub fn transport_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    /// Delivers a server frame on the `n`-th transport created.
    pub async fn push_frame(&self, n: usize, frame: &str) {
        let handle = self.handles.lock().unwrap()[n].clone();
        handle
            .send(TransportEvent::FrameReceived(Bytes::from(
                frame.as_bytes().to_vec(),
            )))
            .await
            .expect("event receiver dropped");
    }

    /// Simulates the server dropping the `n`-th connection.
    pub async fn drop_connection(&self, n: usize) {
        let handle = self.handles.lock().unwrap()[n].clone();
        let _ = handle.send(TransportEvent::Disconnected).await;
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create_transport(
        &self,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
        let (tx, rx) = mpsc::channel(16);
        tx.send(TransportEvent::Connected).await.ok();
        let transport = Arc::new(MockTransport::default());
        self.handles.lock().unwrap().push(tx);
        self.transports.lock().unwrap().push(transport.clone());
        Ok((transport, rx))
    }
}

/// A factory that always fails to dial.
pub struct FailingTransportFactory;

#[async_trait]
impl TransportFactory for FailingTransportFactory {
    async fn create_transport(
        &self,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

/// Canned-response HTTP client recording every request it sees.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<Vec<(String, String, String)>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Responds with `body` to requests whose method matches and whose URL
    /// contains `fragment`.
    pub fn route(&self, method: &str, fragment: &str, body: &str) {
        self.routes.lock().unwrap().push((
            method.to_string(),
            fragment.to_string(),
            body.to_string(),
        ));
    }

    pub fn request_urls(&self, method: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, anyhow::Error> {
        let hit = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(method, fragment, _)| method == &request.method && request.url.contains(fragment))
            .map(|(_, _, body)| body.clone());
        self.requests.lock().unwrap().push(request);

        Ok(match hit {
            Some(body) => HttpResponse {
                status_code: 200,
                body: body.into_bytes(),
            },
            None => HttpResponse {
                status_code: 404,
                body: Vec::new(),
            },
        })
    }
}

/// Lets spawned work (event loops, fire-and-forget calls) run to completion.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
