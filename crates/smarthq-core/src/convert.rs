// ── Wire → domain conversions ──

use std::str::FromStr;

use smarthq_api::wire::ServiceMessage;

use crate::error::CoreError;
use crate::model::{Service, ServiceType};

impl TryFrom<ServiceMessage> for Service {
    type Error = CoreError;

    /// Fails when `serviceType` is not one of the known vendor strings.
    fn try_from(msg: ServiceMessage) -> Result<Self, Self::Error> {
        let service_type =
            ServiceType::from_str(&msg.service_type).map_err(|_| CoreError::Decode {
                message: format!(
                    "service {}: unknown service type {:?}",
                    msg.service_id, msg.service_type
                ),
            })?;

        Ok(Service {
            service_id: msg.service_id,
            service_type,
            domain_type: msg.domain_type,
            device_id: msg.device_id,
            state: msg.state,
            config: msg.config,
            supported_commands: msg.supported_commands.into_iter().collect(),
            last_sync_time: msg.last_sync_time,
            last_state_time: msg.last_state_time,
        })
    }
}
