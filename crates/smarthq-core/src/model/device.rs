// ── Device domain type ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One physical appliance on the account.
///
/// Created by the first `device` message for its id and never removed.
/// `services` is a denormalized cache of the last raw payload seen for
/// each service belonging to the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub device_id: String,
    /// Vendor taxonomy string, e.g. `cloud.smarthq.device.oven`.
    pub device_type: String,
    pub name: String,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub services: BTreeMap<String, Value>,
}

impl Device {
    /// A fresh, offline device. `name` falls back to the id.
    pub fn new(
        device_id: impl Into<String>,
        device_type: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        let device_id = device_id.into();
        Self {
            name: name.unwrap_or_else(|| device_id.clone()),
            device_id,
            device_type: device_type.into(),
            online: false,
            last_seen: None,
            services: BTreeMap::new(),
        }
    }

    pub fn has_service(&self, service_id: &str) -> bool {
        self.services.contains_key(service_id)
    }
}
