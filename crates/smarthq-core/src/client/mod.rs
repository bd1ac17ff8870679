// ── SmartHQ client ──
//
// Full lifecycle management for one event-stream connection:
// authentication, subscription, heartbeat, reconnection, inbound
// dispatch into the registry, and command submission.

mod command;
mod dispatch;
mod tasks;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use futures_util::SinkExt;
use serde::Serialize;
use smarthq_api::wire::{self, SubscriptionRequest};
use smarthq_api::{Authenticator, Connection, FrameSink, Transport};
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::events::{Event, EventBus};
use crate::store::Registry;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Authenticating,
    Connecting,
    Subscribing,
    Connected,
    /// Waiting for, or running, reconnection attempt `attempt` (1-based).
    Reconnecting {
        attempt: u32,
    },
    Closing,
}

// ── Background task bookkeeping ──────────────────────────────────────

/// Tasks tied to one open connection: the frame reader and heartbeat.
struct Session {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Session {
    async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

struct ReconnectTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Client ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. One instance owns one
/// connection, its background tasks, the registry and the event bus.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn Transport>,
    registry: Arc<Registry>,
    events: Arc<EventBus>,
    state: watch::Sender<ConnectionState>,
    /// Session user id from the connection acknowledgement.
    user_id: ArcSwapOption<String>,
    writer: Mutex<Option<FrameSink>>,
    /// Cleared by `disconnect()`, set again by `connect()`.
    auto_reconnect: AtomicBool,
    session: StdMutex<Option<Session>>,
    reconnect: StdMutex<Option<ReconnectTask>>,
    /// Serializes connection establishment against teardown.
    connect_lock: Mutex<()>,
}

impl Client {
    /// Create a client. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(
        config: ClientConfig,
        authenticator: Arc<dyn Authenticator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ClientInner {
                config,
                authenticator,
                transport,
                registry: Arc::new(Registry::new()),
                events: Arc::new(EventBus::new()),
                state,
                user_id: ArcSwapOption::empty(),
                writer: Mutex::new(None),
                auto_reconnect: AtomicBool::new(true),
                session: StdMutex::new(None),
                reconnect: StdMutex::new(None),
                connect_lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }

    // ── State observation ────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.state.borrow() == ConnectionState::Connected
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// User id captured from the last connection acknowledgement.
    pub fn user_id(&self) -> Option<String> {
        self.inner.user_id.load_full().map(|id| String::clone(&id))
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the event stream.
    ///
    /// Authenticates, opens the transport, requests the configured
    /// feeds, starts the reader and heartbeat, and emits `connected`.
    /// A no-op if already connected. Re-enables automatic reconnection
    /// after a previous [`disconnect()`](Self::disconnect).
    ///
    /// A failure here is returned as-is; no reconnection is scheduled.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.auto_reconnect.store(true, Ordering::SeqCst);
        self.try_connect().await
    }

    /// Stop for good: disable reconnection, stop every background task,
    /// close the transport, and emit `disconnected` if a connection was
    /// up. Safe to call any number of times.
    pub async fn disconnect(&self) {
        self.inner.auto_reconnect.store(false, Ordering::SeqCst);

        let reconnect = lock(&self.inner.reconnect).take();
        if let Some(task) = reconnect {
            task.cancel.cancel();
            let _ = task.handle.await;
        }

        let guard = self.inner.connect_lock.lock().await;

        let mut previous = ConnectionState::Disconnected;
        self.inner.state.send_if_modified(|state| {
            previous = state.clone();
            if *state == ConnectionState::Disconnected {
                false
            } else {
                *state = ConnectionState::Closing;
                true
            }
        });

        self.teardown_session().await;
        self.inner.state.send_replace(ConnectionState::Disconnected);
        drop(guard);

        if previous == ConnectionState::Connected {
            info!("Disconnected from SmartHQ");
            self.inner.events.publish(Event::Disconnected).await;
        } else {
            debug!(state = %previous, "Disconnect requested while not connected");
        }
    }

    /// Start the background reconnection loop, unless one is already
    /// running or `disconnect()` has disabled reconnection.
    pub fn start_reconnecting(&self) {
        let mut slot = lock(&self.inner.reconnect);
        if !self.inner.auto_reconnect.load(Ordering::SeqCst) {
            debug!("Reconnection disabled, not scheduling");
            return;
        }
        if slot.is_some() {
            debug!("Reconnection already in progress");
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tasks::reconnect_loop(self.clone(), cancel.clone()));
        *slot = Some(ReconnectTask { cancel, handle });
    }

    // ── Internals ────────────────────────────────────────────────────

    /// One connection attempt, without touching the reconnect switch.
    async fn try_connect(&self) -> Result<(), CoreError> {
        let guard = self.inner.connect_lock.lock().await;
        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        // A dropped connection may have left finished tasks behind.
        self.teardown_session().await;

        if let Err(e) = self.establish().await {
            self.teardown_session().await;
            self.inner.state.send_replace(ConnectionState::Disconnected);
            return Err(e);
        }

        // Published under the lock so a racing disconnect() cannot
        // report `disconnected` ahead of it.
        info!(url = %self.inner.config.url, "Connected to SmartHQ");
        self.inner.events.publish(Event::Connected).await;
        drop(guard);
        Ok(())
    }

    async fn establish(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        let url = &inner.config.url;

        inner.state.send_replace(ConnectionState::Authenticating);
        let credential = inner
            .authenticator
            .authenticate()
            .await
            .map_err(|e| match e {
                smarthq_api::Error::Authentication { message } => {
                    CoreError::AuthenticationFailed { message }
                }
                other => CoreError::AuthenticationFailed {
                    message: other.to_string(),
                },
            })?;

        inner.state.send_replace(ConnectionState::Connecting);
        let Connection { sink, frames } = inner
            .transport
            .open(url, &credential)
            .await
            .map_err(|e| CoreError::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        inner.state.send_replace(ConnectionState::Subscribing);
        *inner.writer.lock().await = Some(sink);

        let cancel = CancellationToken::new();
        let reader = tokio::spawn(tasks::read_loop(self.clone(), frames, cancel.clone()));
        *lock(&inner.session) = Some(Session {
            cancel: cancel.clone(),
            handles: vec![reader],
        });

        self.send_frame(&SubscriptionRequest::new(inner.config.topics))
            .await?;
        debug!(topics = ?inner.config.topics, "Subscription requested");

        // The reader may already have seen the stream end.
        let promoted = inner.state.send_if_modified(|state| {
            if *state == ConnectionState::Subscribing {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        if !promoted {
            return Err(CoreError::ConnectionFailed {
                url: url.to_string(),
                reason: "connection closed while subscribing".into(),
            });
        }

        let period = inner.config.heartbeat_interval;
        if !period.is_zero() {
            let heartbeat = tokio::spawn(tasks::heartbeat_loop(self.clone(), period, cancel));
            if let Some(session) = lock(&inner.session).as_mut() {
                session.handles.push(heartbeat);
            }
        }
        Ok(())
    }

    /// Stop the connection's tasks and close the transport.
    async fn teardown_session(&self) {
        let session = lock(&self.inner.session).take();
        if let Some(session) = session {
            session.shutdown().await;
        }

        let writer = self.inner.writer.lock().await.take();
        if let Some(mut sink) = writer {
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Closing the event stream failed");
            }
        }
    }

    /// Encode and write one frame on the current connection.
    pub(crate) async fn send_frame<T: Serialize + Sync>(&self, message: &T) -> Result<(), CoreError> {
        let text = wire::encode(message)?;
        let mut writer = self.inner.writer.lock().await;
        let sink = writer.as_mut().ok_or(CoreError::NotConnected)?;
        sink.send(text).await?;
        Ok(())
    }

    /// Called by the reconnect loop after a successful attempt. Retires
    /// the loop if the connection is still up; otherwise the loop keeps
    /// going, since the reader found it busy and did not start another.
    fn finish_reconnect(&self) -> bool {
        let mut slot = lock(&self.inner.reconnect);
        if self.is_connected() {
            *slot = None;
            true
        } else {
            false
        }
    }

    fn retire_reconnect(&self) {
        lock(&self.inner.reconnect).take();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.config.url.as_str())
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
