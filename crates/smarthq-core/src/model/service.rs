// ── Service domain types ──

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

/// Closed set of service capabilities the vendor publishes.
///
/// Parsed from and displayed as the vendor string
/// (`cloud.smarthq.service.*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter)]
pub enum ServiceType {
    #[strum(serialize = "cloud.smarthq.service.temperature")]
    Temperature,
    #[strum(serialize = "cloud.smarthq.service.toggle")]
    Toggle,
    #[strum(serialize = "cloud.smarthq.service.mode")]
    Mode,
    #[strum(serialize = "cloud.smarthq.service.meter")]
    Meter,
    #[strum(serialize = "cloud.smarthq.service.cycletimer")]
    CycleTimer,
    #[strum(serialize = "cloud.smarthq.service.integer")]
    Integer,
    #[strum(serialize = "cloud.smarthq.service.string")]
    String,
    #[strum(serialize = "cloud.smarthq.service.provider")]
    Provider,
    #[strum(serialize = "cloud.smarthq.service.color")]
    Color,
    #[strum(serialize = "cloud.smarthq.service.trigger")]
    Trigger,
    #[strum(serialize = "cloud.smarthq.service.cooking.state.v1")]
    CookingState,
    #[strum(serialize = "cloud.smarthq.service.cooking.mode.v1")]
    CookingMode,
    #[strum(serialize = "cloud.smarthq.service.cooking.history")]
    CookingHistory,
    #[strum(serialize = "cloud.smarthq.service.cooking.burner.status.v1")]
    CookingBurnerStatus,
    #[strum(serialize = "cloud.smarthq.service.thermostat.v1")]
    Thermostat,
    #[strum(serialize = "cloud.smarthq.service.firmware.v1")]
    Firmware,
    #[strum(serialize = "cloud.smarthq.service.laundry.commercial.v1")]
    LaundryCommercial,
}

impl ServiceType {
    /// Short human-facing name, e.g. `cycle-timer`.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Toggle => "toggle",
            Self::Mode => "mode",
            Self::Meter => "meter",
            Self::CycleTimer => "cycle-timer",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Provider => "provider",
            Self::Color => "color",
            Self::Trigger => "trigger",
            Self::CookingState => "cooking-state",
            Self::CookingMode => "cooking-mode",
            Self::CookingHistory => "cooking-history",
            Self::CookingBurnerStatus => "cooking-burner-status",
            Self::Thermostat => "thermostat",
            Self::Firmware => "firmware",
            Self::LaundryCommercial => "laundry-commercial",
        }
    }
}

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One controllable or observable capability of a device.
///
/// Replaced wholesale by every `service` message for its id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub service_id: String,
    pub service_type: ServiceType,
    /// Vendor domain, e.g. `cloud.smarthq.domain.oven.upper`.
    pub domain_type: String,
    pub device_id: String,
    pub state: Map<String, Value>,
    pub config: Map<String, Value>,
    pub supported_commands: BTreeSet<String>,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_state_time: Option<DateTime<Utc>>,
}

impl Service {
    pub fn supports(&self, command: &str) -> bool {
        self.supported_commands.contains(command)
    }
}
