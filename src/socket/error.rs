use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Socket is closed")]
    SocketClosed,
    #[error("Socket is already open")]
    SocketAlreadyOpen,
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Bad frame: {0}")]
    BadFrame(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SocketError>;
