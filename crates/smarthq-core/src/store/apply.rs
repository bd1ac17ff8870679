// ── Stream update application ──
//
// Applies decoded stream messages to the registry. Called only from
// the dispatch path, one message at a time, in delivery order.

use std::sync::Arc;

use serde_json::Value;
use smarthq_api::wire::{DeviceMessage, PresenceMessage};

use super::Registry;
use crate::model::{Device, Service};

/// Whether an upsert created a new entity or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

impl Registry {
    /// Create or update a device from a `device` message.
    ///
    /// Type and name are overwritten; presence and the service cache
    /// are carried over from the existing record.
    pub(crate) fn apply_device(&self, msg: &DeviceMessage) -> (Arc<Device>, Upsert) {
        let (device, is_new) = self.devices.upsert_with(msg.device_id.clone(), |existing| {
            let mut next = Device::new(&*msg.device_id, &*msg.device_type, msg.name.clone());
            if let Some(prev) = existing {
                next.online = prev.online;
                next.last_seen = prev.last_seen;
                next.services.clone_from(&prev.services);
            }
            next
        });
        let outcome = if is_new { Upsert::Added } else { Upsert::Updated };
        (device, outcome)
    }

    /// Record presence for a known device. Unknown devices are left
    /// alone and `None` is returned.
    ///
    /// `last_seen` only moves when the message carries one.
    pub(crate) fn apply_presence(&self, msg: &PresenceMessage) -> Option<Arc<Device>> {
        self.devices.update(&msg.device_id, |prev| {
            let mut next = prev.clone();
            next.online = msg.presence.online;
            if msg.presence.last_seen.is_some() {
                next.last_seen = msg.presence.last_seen;
            }
            next
        })
    }

    /// Insert or wholly replace a service, and refresh the owning
    /// device's cached payload if that device is known.
    pub(crate) fn apply_service(&self, service: Service, raw: Value) -> Arc<Service> {
        let service_id = service.service_id.clone();
        let device_id = service.device_id.clone();

        let (stored, _) = self.services.upsert(service_id.clone(), service);

        let cached = self.devices.update(&device_id, |prev| {
            let mut next = prev.clone();
            next.services.insert(service_id.clone(), raw);
            next
        });
        if cached.is_none() {
            tracing::debug!(
                service_id = %service_id,
                device_id = %device_id,
                "Service references an unknown device, stored without a cache entry"
            );
        }

        stored
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use serde_json::{Map, json};
    use smarthq_api::wire::Presence;

    use super::*;
    use crate::model::ServiceType;

    fn device_msg(id: &str, device_type: &str, name: Option<&str>) -> DeviceMessage {
        DeviceMessage {
            device_id: id.into(),
            device_type: device_type.into(),
            name: name.map(str::to_owned),
        }
    }

    fn presence_msg(id: &str, online: bool) -> PresenceMessage {
        PresenceMessage {
            device_id: id.into(),
            presence: Presence {
                online,
                last_seen: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            },
        }
    }

    fn temperature(id: &str, device_id: &str, celsius: i64) -> Service {
        let mut state = Map::new();
        state.insert("celsius".into(), json!(celsius));
        Service {
            service_id: id.into(),
            service_type: ServiceType::Temperature,
            domain_type: "cloud.smarthq.domain.oven.upper".into(),
            device_id: device_id.into(),
            state,
            config: Map::new(),
            supported_commands: BTreeSet::new(),
            last_sync_time: None,
            last_state_time: None,
        }
    }

    #[test]
    fn first_device_message_adds_then_updates() {
        let registry = Registry::new();
        let (_, first) = registry.apply_device(&device_msg("d1", "oven", None));
        let (device, second) = registry.apply_device(&device_msg("d1", "oven", Some("Range")));

        assert_eq!(first, Upsert::Added);
        assert_eq!(second, Upsert::Updated);
        assert_eq!(device.name, "Range");
        assert_eq!(registry.device_count(), 1);
    }

    #[test]
    fn device_update_keeps_presence_and_cache() {
        let registry = Registry::new();
        registry.apply_device(&device_msg("d1", "oven", None));
        registry.apply_presence(&presence_msg("d1", true));
        registry.apply_service(temperature("s1", "d1", 180), json!({"serviceId": "s1"}));

        let (device, _) = registry.apply_device(&device_msg("d1", "range", None));
        assert!(device.online);
        assert!(device.last_seen.is_some());
        assert!(device.has_service("s1"));
        assert_eq!(device.device_type, "range");
    }

    #[test]
    fn presence_for_unknown_device_changes_nothing() {
        let registry = Registry::new();
        assert!(registry.apply_presence(&presence_msg("ghost", true)).is_none());
        assert_eq!(registry.device_count(), 0);
    }

    #[test]
    fn presence_without_last_seen_keeps_previous() {
        let registry = Registry::new();
        registry.apply_device(&device_msg("d1", "oven", None));
        registry.apply_presence(&presence_msg("d1", true));

        let offline = PresenceMessage {
            device_id: "d1".into(),
            presence: Presence {
                online: false,
                last_seen: None,
            },
        };
        let device = registry.apply_presence(&offline).unwrap();
        assert!(!device.online);
        assert!(device.last_seen.is_some());
    }

    #[test]
    fn service_replacement_is_total() {
        let registry = Registry::new();
        let mut first = temperature("s1", "d1", 180);
        first.config.insert("units".into(), json!("celsius"));
        registry.apply_service(first, json!({}));

        let replaced = registry.apply_service(temperature("s1", "d1", 200), json!({}));
        assert_eq!(replaced.state["celsius"], json!(200));
        assert!(replaced.config.is_empty());
        assert_eq!(registry.service_count(), 1);
    }

    #[test]
    fn orphan_service_is_stored() {
        let registry = Registry::new();
        registry.apply_service(temperature("s9", "nowhere", 20), json!({}));
        assert!(registry.service_by_id("s9").is_some());
        assert!(registry.device_by_id("nowhere").is_none());
        assert_eq!(registry.services_for_device("nowhere").len(), 1);
    }

    #[test]
    fn queries_filter_by_type() {
        let registry = Registry::new();
        registry.apply_device(&device_msg("d1", "oven", None));
        registry.apply_device(&device_msg("d2", "dishwasher", None));
        registry.apply_service(temperature("s1", "d1", 180), json!({}));

        assert_eq!(registry.devices_by_type("oven").len(), 1);
        assert_eq!(registry.services_by_type(ServiceType::Temperature).len(), 1);
        assert!(registry.services_by_type(ServiceType::Toggle).is_empty());
        assert!(registry.device_by_id("missing").is_none());
        assert!(registry.service_by_id("missing").is_none());
    }
}
