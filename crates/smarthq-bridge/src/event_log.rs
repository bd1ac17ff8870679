//! Bounded history of domain events for `GET /events`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::Serialize;
use strum::IntoEnumIterator;

use smarthq_core::{Event, EventBus, EventHandler, EventKind, HandlerError};

/// One recorded event with the time it was published.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedEvent {
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

/// Ring buffer holding the most recent `capacity` events.
pub struct EventLog {
    capacity: usize,
    entries: Mutex<VecDeque<LoggedEvent>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Subscribe this log to every event name on `bus`.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        for kind in EventKind::iter() {
            bus.subscribe(kind, Arc::clone(self) as Arc<dyn EventHandler>);
        }
    }

    pub fn record(&self, event: Event) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LoggedEvent {
            received_at: Utc::now(),
            event,
        });
    }

    /// Retained events, newest first.
    pub fn recent(&self) -> Vec<LoggedEvent> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().cloned().collect()
    }
}

impl EventHandler for EventLog {
    fn handle<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            self.record(event.clone());
            Ok(())
        })
    }
}
