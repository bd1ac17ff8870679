// ── Registry ──
//
// Authoritative in-memory mapping of device and service ids to their
// latest state. Outlives any single connection: a reconnect keeps what
// is already known and the stream refreshes it.

use std::sync::Arc;

use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Device, Service, ServiceType};

/// Central store for everything the event stream has described.
pub struct Registry {
    pub(super) devices: EntityCollection<Device>,
    pub(super) services: EntityCollection<Service>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            devices: EntityCollection::new(),
            services: EntityCollection::new(),
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// All devices, ordered by id.
    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    /// All services, ordered by id.
    pub fn services_snapshot(&self) -> Arc<Vec<Arc<Service>>> {
        self.services.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device_by_id(&self, device_id: &str) -> Option<Arc<Device>> {
        self.devices.get(device_id)
    }

    pub fn service_by_id(&self, service_id: &str) -> Option<Arc<Service>> {
        self.services.get(service_id)
    }

    // ── Filtered queries ─────────────────────────────────────────────

    /// Services whose `device_id` is `device_id`, known device or not.
    pub fn services_for_device(&self, device_id: &str) -> Vec<Arc<Service>> {
        self.services
            .snapshot()
            .iter()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect()
    }

    pub fn devices_by_type(&self, device_type: &str) -> Vec<Arc<Device>> {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.device_type == device_type)
            .cloned()
            .collect()
    }

    pub fn services_by_type(&self, service_type: ServiceType) -> Vec<Arc<Service>> {
        self.services
            .snapshot()
            .iter()
            .filter(|s| s.service_type == service_type)
            .cloned()
            .collect()
    }

    // ── Counts ───────────────────────────────────────────────────────

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> watch::Receiver<Arc<Vec<Arc<Device>>>> {
        self.devices.subscribe()
    }

    pub fn subscribe_services(&self) -> watch::Receiver<Arc<Vec<Arc<Service>>>> {
        self.services.subscribe()
    }
}
