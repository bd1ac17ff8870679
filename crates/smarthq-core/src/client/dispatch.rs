// ── Inbound dispatch ──
//
// Routes each decoded frame to the registry and the event bus. Runs on
// the reader task only, so messages are applied in delivery order.

use std::sync::Arc;

use smarthq_api::wire::{self, Inbound};
use tracing::{debug, info, warn};

use super::Client;
use crate::error::CoreError;
use crate::events::Event;
use crate::model::Service;
use crate::store::Upsert;

impl Client {
    /// Apply one text frame. Frames that cannot be decoded are logged
    /// and dropped; they never end the connection.
    pub(crate) async fn dispatch(&self, text: &str) {
        let inbound = match wire::decode(text) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %CoreError::from(e), "Discarding inbound frame");
                return;
            }
        };

        let inner = &self.inner;
        match inbound {
            Inbound::Pong(pong) => {
                debug!(id = pong.id.as_deref().unwrap_or("-"), "Pong received");
            }
            Inbound::ConnectionAck(ack) => {
                info!(user_id = ?ack.user_id, "Connection acknowledged");
                if let Some(user_id) = ack.user_id {
                    inner.user_id.store(Some(Arc::new(user_id)));
                }
            }
            Inbound::CommandResult(payload) => {
                inner.events.publish(Event::CommandResult { payload }).await;
            }
            Inbound::Presence(msg) => {
                let known = inner.registry.apply_presence(&msg).is_some();
                debug!(
                    device_id = %msg.device_id,
                    online = msg.presence.online,
                    known,
                    "Presence update"
                );
                inner
                    .events
                    .publish(Event::PresenceChanged {
                        device_id: msg.device_id,
                        online: msg.presence.online,
                        last_seen: msg.presence.last_seen,
                    })
                    .await;
            }
            Inbound::Device(msg) => {
                let (device, outcome) = inner.registry.apply_device(&msg);
                let event = match outcome {
                    Upsert::Added => {
                        info!(
                            device_id = %device.device_id,
                            device_type = %device.device_type,
                            "Device discovered"
                        );
                        Event::DeviceAdded { device }
                    }
                    Upsert::Updated => Event::DeviceUpdated { device },
                };
                inner.events.publish(event).await;
            }
            Inbound::Alert(payload) => {
                info!("Alert received");
                inner.events.publish(Event::AlertReceived { payload }).await;
            }
            Inbound::Service { message, raw } => {
                let service = match Service::try_from(message) {
                    Ok(service) => service,
                    Err(e) => {
                        warn!(error = %e, "Discarding service update");
                        return;
                    }
                };
                let service = inner.registry.apply_service(service, raw);
                debug!(
                    service_id = %service.service_id,
                    service_type = service.service_type.short_name(),
                    "Service updated"
                );
                inner.events.publish(Event::ServiceUpdated { service }).await;
            }
            Inbound::Ignored(kind) => debug!(%kind, "Ignoring message"),
        }
    }
}
