use thiserror::Error;

/// Top-level error type for the `smarthq-api` crate.
///
/// Covers every failure mode below the domain layer: credential
/// acquisition, the WebSocket transport, and frame encoding/decoding.
/// `smarthq-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The authenticator could not produce a bearer credential.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Endpoint URL could not be turned into a WebSocket request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// WebSocket handshake or read failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The server closed the stream with a non-normal close code.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Writing a frame to the socket failed.
    #[error("WebSocket send failed: {0}")]
    Send(String),

    /// No open connection to send on.
    #[error("Not connected to SmartHQ")]
    NotConnected,

    // ── Frames ──────────────────────────────────────────────────────
    /// The frame was not a JSON document.
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    /// The frame was JSON but did not match the shape of its kind.
    #[error("Failed to decode {kind} message: {message}")]
    Decode { kind: String, message: String },

    /// The `kind` discriminator is not one we know about.
    #[error("Unknown message kind: {0:?}")]
    UnknownKind(String),

    /// Serializing an outbound message failed.
    #[error("Failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if the failure concerns a single frame and the
    /// stream it arrived on is still usable.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame { .. } | Self::Decode { .. } | Self::UnknownKind(_)
        )
    }
}
