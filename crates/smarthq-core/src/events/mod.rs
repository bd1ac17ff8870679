// ── Domain events ──
//
// What observers are told about. Every event has a fixed name
// (`EventKind`) that handlers subscribe to.

mod bus;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::model::{Device, Service};

pub use bus::{EventBus, EventHandler, HandlerError, SubscriptionId, async_handler, sync_handler};

/// The fixed set of event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DeviceAdded,
    DeviceUpdated,
    ServiceUpdated,
    AlertReceived,
    PresenceChanged,
    CommandResult,
    Connected,
    Disconnected,
}

/// A domain event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    DeviceAdded {
        device: Arc<Device>,
    },
    DeviceUpdated {
        device: Arc<Device>,
    },
    ServiceUpdated {
        service: Arc<Service>,
    },
    /// Raw alert payload as received.
    AlertReceived {
        payload: Value,
    },
    /// Emitted for every presence message, whether or not the device is
    /// known to the registry.
    PresenceChanged {
        device_id: String,
        online: bool,
        last_seen: Option<DateTime<Utc>>,
    },
    /// Raw command result payload; not correlated with any request.
    CommandResult {
        payload: Value,
    },
    Connected,
    Disconnected,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DeviceAdded { .. } => EventKind::DeviceAdded,
            Self::DeviceUpdated { .. } => EventKind::DeviceUpdated,
            Self::ServiceUpdated { .. } => EventKind::ServiceUpdated,
            Self::AlertReceived { .. } => EventKind::AlertReceived,
            Self::PresenceChanged { .. } => EventKind::PresenceChanged,
            Self::CommandResult { .. } => EventKind::CommandResult,
            Self::Connected => EventKind::Connected,
            Self::Disconnected => EventKind::Disconnected,
        }
    }
}
