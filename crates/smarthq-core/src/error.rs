// ── Core error types ──
//
// User-facing errors from smarthq-core. Consumers never see raw
// tungstenite or serde failures; the `From<smarthq_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to SmartHQ at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to SmartHQ")]
    NotConnected,

    #[error("Failed to send frame: {message}")]
    SendFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Service not found: {identifier}")]
    ServiceNotFound { identifier: String },

    // ── Frame errors ─────────────────────────────────────────────────
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Unknown message kind: {kind:?}")]
    UnknownKind { kind: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<smarthq_api::Error> for CoreError {
    fn from(err: smarthq_api::Error) -> Self {
        use smarthq_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            Api::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            Api::Send(message) => CoreError::SendFailed { message },
            Api::NotConnected => CoreError::NotConnected,
            Api::MalformedFrame { message } => CoreError::Decode {
                message: format!("malformed frame: {message}"),
            },
            Api::Decode { kind, message } => CoreError::Decode {
                message: format!("{kind}: {message}"),
            },
            Api::UnknownKind(kind) => CoreError::UnknownKind { kind },
            Api::Encode(e) => CoreError::Internal(format!("Encoding error: {e}")),
        }
    }
}
