//! WebSocket transport for the SmartHQ event stream.
//!
//! Opens a TLS WebSocket to the regional endpoint with the bearer
//! credential on the upgrade request, then splits the socket into a
//! text-frame sink and a text-frame stream. Protocol-level ping/pong
//! and binary frames never reach the caller; tungstenite answers pings
//! on its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::{SinkExt, StreamExt};
//! use smarthq_api::{Transport, WebSocketTransport};
//!
//! let url = url::Url::parse("wss://ws-us-west-2.mysmarthq.com")?;
//! let mut conn = WebSocketTransport::new().open(&url, &token).await?;
//! conn.sink.send(r#"{"kind":"websocket#ping","id":"1","action":"ping"}"#.into()).await?;
//! while let Some(frame) = conn.frames.next().await {
//!     println!("{}", frame?);
//! }
//! ```

use futures_util::future::{self, BoxFuture};
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use url::Url;

use crate::error::Error;
use crate::transport::{Connection, Transport};

// ── WebSocketTransport ───────────────────────────────────────────────

/// Production [`Transport`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn open<'a>(
        &'a self,
        url: &'a Url,
        credential: &'a SecretString,
    ) -> BoxFuture<'a, Result<Connection, Error>> {
        Box::pin(connect(url, credential))
    }
}

// ── Single connection setup ──────────────────────────────────────────

async fn connect(url: &Url, credential: &SecretString) -> Result<Connection, Error> {
    tracing::info!(url = %url, "Connecting to WebSocket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::InvalidUrl(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri).with_header(
        "Authorization",
        format!("Bearer {}", credential.expose_secret()),
    );

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("WebSocket connected");

    let (write, read) = ws_stream.split();

    let sink = write
        .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::Text(text.into()))))
        .sink_map_err(|e| Error::Send(e.to_string()));

    let frames = read.filter_map(|frame| future::ready(text_frame(frame)));

    Ok(Connection {
        sink: Box::pin(sink),
        frames: frames.boxed(),
    })
}

// ── Frame filtering ──────────────────────────────────────────────────

/// Reduce a raw WebSocket frame to what the client cares about.
///
/// Text frames pass through. A close frame with a normal or going-away
/// code ends the stream quietly (tungstenite yields `None` right after
/// it); any other close code, or a read error, surfaces as an error.
fn text_frame(frame: Result<Message, tungstenite::Error>) -> Option<Result<String, Error>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Close(Some(cf))) => {
            tracing::info!(
                code = %cf.code,
                reason = %cf.reason,
                "WebSocket close frame received"
            );
            match cf.code {
                CloseCode::Normal | CloseCode::Away => None,
                code => Some(Err(Error::WebSocketClosed {
                    code: code.into(),
                    reason: cf.reason.as_str().to_owned(),
                })),
            }
        }
        Ok(Message::Close(None)) => {
            tracing::info!("WebSocket close frame received (no payload)");
            None
        }
        Ok(Message::Ping(_)) => {
            tracing::trace!("WebSocket ping");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(Error::WebSocketConnect(e.to_string()))),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
