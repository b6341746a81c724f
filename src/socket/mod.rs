pub mod error;
pub mod frames;
pub mod websocket;

pub use error::{Result, SocketError};
pub use frames::{ClientFrame, ServerFrame};
pub use websocket::{WebSocketTransport, WebSocketTransportFactory};
