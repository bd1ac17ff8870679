//! In-memory [`Transport`] for tests.
//!
//! Every successful `open()` hands a [`MemoryPeer`] to the test through
//! the receiver returned by [`MemoryTransport::new`]. The peer plays the
//! server: it pushes inbound frames and reads what the client sent.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::PollSender;
use url::Url;

use crate::error::Error;
use crate::transport::{Connection, Transport};

const OUTBOUND_BUFFER: usize = 64;

pub struct MemoryTransport {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    fail_remaining: AtomicUsize,
    attempts: Mutex<Vec<Instant>>,
}

impl MemoryTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let transport = Self {
            peers,
            fail_remaining: AtomicUsize::new(0),
            attempts: Mutex::new(Vec::new()),
        };
        (transport, rx)
    }

    /// Make the next `n` calls to `open()` fail with a connect error.
    pub fn fail_next_opens(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Number of `open()` calls so far, failed ones included.
    pub fn open_count(&self) -> usize {
        self.attempts.lock().map(|a| a.len()).unwrap_or_default()
    }

    /// When each `open()` call happened, in order.
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn open_now(&self, url: &Url, credential: &SecretString) -> Result<Connection, Error> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(Instant::now());
        }

        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::WebSocketConnect("connection refused".into()));
        }

        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            url: url.clone(),
            credential: credential.clone(),
            inbound: Some(in_tx),
            outbound: out_rx,
        };
        self.peers
            .send(peer)
            .map_err(|_| Error::WebSocketConnect("no peer listening".into()))?;

        let sink = PollSender::new(out_tx).sink_map_err(|_| Error::NotConnected);
        Ok(Connection {
            sink: Box::pin(sink),
            frames: UnboundedReceiverStream::new(in_rx).boxed(),
        })
    }
}

impl Transport for MemoryTransport {
    fn open<'a>(
        &'a self,
        url: &'a Url,
        credential: &'a SecretString,
    ) -> BoxFuture<'a, Result<Connection, Error>> {
        Box::pin(futures_util::future::ready(self.open_now(url, credential)))
    }
}

/// Server side of one in-memory connection.
pub struct MemoryPeer {
    url: Url,
    credential: SecretString,
    inbound: Option<mpsc::UnboundedSender<Result<String, Error>>>,
    outbound: mpsc::Receiver<String>,
}

impl MemoryPeer {
    /// Deliver a text frame to the client. Returns `false` once closed.
    pub fn push(&self, frame: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(frame.into())).is_ok())
    }

    /// Fail the client's read side, as an abnormal close would.
    pub fn push_error(&self, err: Error) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Err(err)).is_ok())
    }

    /// End the inbound stream cleanly.
    pub fn close(&mut self) {
        self.inbound = None;
    }

    /// Next frame the client sent, waiting for it. `None` once the
    /// client has closed its sink and everything was read.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    pub fn try_next_sent(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn credential(&self) -> &SecretString {
        &self.credential
    }
}

impl std::fmt::Debug for MemoryPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPeer")
            .field("url", &self.url.as_str())
            .field("open", &self.inbound.is_some())
            .finish_non_exhaustive()
    }
}
