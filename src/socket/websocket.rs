use crate::net::{Transport, TransportEvent, TransportFactory};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type RawWs = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<RawWs, Message>;
type WsStream = SplitStream<RawWs>;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Websocket-backed push channel.
pub struct WebSocketTransport {
    ws_sink: Arc<Mutex<Option<WsSink>>>,
    is_connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, data: &[u8]) -> Result<(), anyhow::Error> {
        let mut sink_guard = self.ws_sink.lock().await;
        let sink = sink_guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("socket is closed"))?;

        let text = std::str::from_utf8(data)
            .map_err(|e| anyhow::anyhow!("frame is not valid UTF-8: {e}"))?;
        debug!("--> Sending frame: {} bytes", data.len());
        sink.send(Message::text(text.to_owned()))
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket send error: {e}"))?;
        Ok(())
    }

    async fn disconnect(&self) {
        let mut is_connected = self.is_connected.lock().await;
        if *is_connected {
            *is_connected = false;
            *self.ws_sink.lock().await = None;
        }
    }
}

/// Factory dialing the configured push channel endpoint.
pub struct WebSocketTransportFactory {
    url: String,
}

impl WebSocketTransportFactory {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl TransportFactory for WebSocketTransportFactory {
    async fn create_transport(
        &self,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
        info!("Dialing {}", self.url);
        let (ws, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("failed to dial {}: {e}", self.url))?;

        let (sink, stream) = ws.split();
        let transport = Arc::new(WebSocketTransport {
            ws_sink: Arc::new(Mutex::new(Some(sink))),
            is_connected: Arc::new(Mutex::new(true)),
        });

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        events_tx
            .send(TransportEvent::Connected)
            .await
            .map_err(|_| anyhow::anyhow!("event receiver dropped before connect"))?;

        tokio::spawn(read_pump(
            stream,
            events_tx,
            transport.is_connected.clone(),
        ));

        Ok((transport, events_rx))
    }
}

async fn read_pump(
    mut stream: WsStream,
    events_tx: mpsc::Sender<TransportEvent>,
    is_connected: Arc<Mutex<bool>>,
) {
    loop {
        match stream.next().await {
            Some(Ok(msg)) => {
                if msg.is_text() || msg.is_binary() {
                    let data: Bytes = msg.into_data();
                    trace!("<-- Received frame: {} bytes", data.len());
                    if events_tx
                        .send(TransportEvent::FrameReceived(data))
                        .await
                        .is_err()
                    {
                        warn!("Frame receiver dropped, closing read pump");
                        break;
                    }
                } else if msg.is_close() {
                    trace!("Received close frame");
                    break;
                }
            }
            Some(Err(e)) => {
                error!("Error reading from websocket: {e}");
                break;
            }
            None => {
                trace!("Websocket stream ended");
                break;
            }
        }
    }

    *is_connected.lock().await = false;
    let _ = events_tx.send(TransportEvent::Disconnected).await;
}
