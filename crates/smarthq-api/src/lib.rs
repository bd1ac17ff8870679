// smarthq-api: Wire protocol and transport for the SmartHQ event-stream API

pub mod auth;
pub mod error;
#[cfg(feature = "test-util")]
pub mod memory;
pub mod transport;
pub mod websocket;
pub mod wire;

pub use auth::{Authenticator, StaticTokenAuthenticator};
pub use error::Error;
pub use transport::{Connection, FrameSink, FrameStream, Transport};
pub use websocket::WebSocketTransport;
