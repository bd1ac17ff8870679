// ── Event bus ──
//
// Named fan-out of domain events to registered handlers. Handlers for
// one event name run sequentially in registration order; a handler
// that fails or panics is logged and skipped.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, error, warn};

use super::{Event, EventKind};

/// Error a handler may return. Logged, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An observer of domain events.
///
/// Handlers run on the client's dispatch path, and `connected` is
/// delivered while a connection attempt still holds its lock. They must
/// not call `Client::connect()` or `Client::disconnect()` directly;
/// spawn a task for it instead.
pub trait EventHandler: Send + Sync {
    fn handle<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<(), HandlerError>>;
}

// ── Handler adapters ─────────────────────────────────────────────────

struct SyncHandler<F>(F);

impl<F> EventHandler for SyncHandler<F>
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move { (self.0)(event) })
    }
}

struct AsyncHandler<F>(F);

impl<F, Fut> EventHandler for AsyncHandler<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn handle<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move { (self.0)(event.clone()).await })
    }
}

/// Wrap a plain closure as a handler.
pub fn sync_handler<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(SyncHandler(f))
}

/// Wrap an async closure as a handler. The event is cloned per call.
pub fn async_handler<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(AsyncHandler(f))
}

// ── EventBus ─────────────────────────────────────────────────────────

type HandlerList = Vec<(SubscriptionId, Arc<dyn EventHandler>)>;

#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<EventKind, HandlerList>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.entry(kind).or_default().push((id, handler));
        debug!(event = %kind, ?id, "Handler subscribed");
        id
    }

    /// Subscribe by event name. Unknown names are logged and ignored.
    pub fn subscribe_named(
        &self,
        name: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Option<SubscriptionId> {
        if let Ok(kind) = EventKind::from_str(name) {
            Some(self.subscribe(kind, handler))
        } else {
            warn!(event = name, "Ignoring subscription to unknown event");
            None
        }
    }

    /// Remove a handler. Returns `false` if it was not subscribed to `kind`.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(mut list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        before != list.len()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, |list| list.len())
    }

    /// Deliver `event` to every handler subscribed to its kind.
    pub async fn publish(&self, event: Event) {
        let kind = event.kind();
        // Clone the list so no map guard is held across an await.
        let handlers: HandlerList = match self.handlers.get(&kind) {
            Some(list) => list.clone(),
            None => return,
        };

        for (id, handler) in handlers {
            match AssertUnwindSafe(handler.handle(&event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(event = %kind, ?id, error = %e, "Event handler failed"),
                Err(_) => error!(event = %kind, ?id, "Event handler panicked"),
            }
        }
    }
}
