// Transport capability: a persistent, bidirectional text-frame connection.
//
// The client never talks to tungstenite directly. It asks a `Transport`
// for a `Connection`, writes JSON text into the sink, and reads JSON text
// out of the frame stream until it ends.

use std::pin::Pin;

use futures_util::Sink;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Outbound half of a connection. Closing it is idempotent.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Inbound half of a connection.
///
/// Yields text frames in delivery order. `None` means the remote end
/// closed the connection cleanly; an `Err` item means it went away
/// abnormally. The stream is not restartable.
pub type FrameStream = BoxStream<'static, Result<String, Error>>;

/// An open connection, split into its two halves.
pub struct Connection {
    pub sink: FrameSink,
    pub frames: FrameStream,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens connections to the event-stream endpoint.
pub trait Transport: Send + Sync {
    fn open<'a>(
        &'a self,
        url: &'a Url,
        credential: &'a SecretString,
    ) -> BoxFuture<'a, Result<Connection, Error>>;
}
