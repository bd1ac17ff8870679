//! Smart-home entity view of the registry.
//!
//! Pure presentation: each supported service becomes one sensor or
//! switch entity whose availability follows the owning device.

use serde::Serialize;
use serde_json::{Map, Value, json};

use smarthq_core::{Device, Registry, Service, ServiceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
    Switch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub entity_id: String,
    pub platform: Platform,
    pub name: String,
    pub device_id: String,
    pub service_id: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub state: Value,
    pub attributes: Map<String, Value>,
    /// Command payloads for switches whose service accepts `set`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
}

/// Every entity the registry currently supports, grouped by device.
pub fn from_registry(registry: &Registry) -> Vec<Entity> {
    registry
        .devices_snapshot()
        .iter()
        .flat_map(|device| {
            registry
                .services_for_device(&device.device_id)
                .into_iter()
                .filter_map(|service| entity_for(device, &service))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Map one service, or `None` for types without an entity.
pub fn entity_for(device: &Device, service: &Service) -> Option<Entity> {
    let base = Entity {
        entity_id: format!("smarthq_{}_{}", device.device_id, service.service_id),
        platform: Platform::Sensor,
        name: device.name.clone(),
        device_id: device.device_id.clone(),
        service_id: service.service_id.clone(),
        available: device.online,
        device_class: None,
        unit: None,
        state: Value::Null,
        attributes: Map::new(),
        actions: None,
    };

    match service.service_type {
        ServiceType::Temperature => Some(temperature(device, service, base)),
        ServiceType::Toggle => Some(toggle(service, base)),
        ServiceType::Mode => Some(mode(service, base)),
        ServiceType::Meter => Some(meter(service, base)),
        _ => None,
    }
}

fn temperature(device: &Device, service: &Service, base: Entity) -> Entity {
    let state = &service.state;
    let celsius = ["celsius", "celsiusConverted"]
        .iter()
        .find_map(|key| state.get(*key).and_then(Value::as_f64));

    Entity {
        entity_id: format!("smarthq_{}_temp", device.device_id),
        name: format!("{} Temperature", base.name),
        device_class: Some("temperature"),
        unit: Some("°C".into()),
        state: celsius.map_or(Value::Null, Value::from),
        attributes: attributes([
            ("fahrenheit", field(state, "fahrenheit")),
            ("fahrenheit_converted", field(state, "fahrenheitConverted")),
            ("celsius_converted", field(state, "celsiusConverted")),
            ("disabled", disabled(state)),
        ]),
        ..base
    }
}

fn toggle(service: &Service, base: Entity) -> Entity {
    let suffix = last_segment(&service.domain_type).map_or_else(|| "Toggle".to_owned(), title_case);
    let is_on = service
        .state
        .get("on")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let actions = service.supports("set").then(|| {
        json!({
            "turn_on": {"command": "set", "data": [{"on": true}]},
            "turn_off": {"command": "set", "data": [{"on": false}]},
        })
    });

    Entity {
        platform: Platform::Switch,
        name: format!("{} {suffix}", base.name),
        state: Value::Bool(is_on),
        actions,
        ..base
    }
}

fn mode(service: &Service, base: Entity) -> Entity {
    let value = service
        .state
        .get("mode")
        .and_then(Value::as_str)
        .and_then(last_segment)
        .map_or(Value::Null, |mode| {
            Value::String(title_case(&mode.replace('_', " ")))
        });

    Entity {
        entity_id: format!("{}_mode", base.entity_id),
        name: format!("{} Mode", base.name),
        state: value,
        attributes: attributes([
            (
                "supported_modes",
                service
                    .config
                    .get("supportedModes")
                    .cloned()
                    .unwrap_or_else(|| Value::Array(Vec::new())),
            ),
            ("disabled", disabled(&service.state)),
        ]),
        ..base
    }
}

fn meter(service: &Service, base: Entity) -> Entity {
    let state = &service.state;
    let config = &service.config;
    let unit = config
        .get("meterUnits")
        .and_then(Value::as_str)
        .and_then(meter_unit);

    Entity {
        entity_id: format!("{}_meter", base.entity_id),
        name: format!("{} Meter", base.name),
        unit,
        state: field(state, "meterValue"),
        attributes: attributes([
            ("meter_value_delta", field(state, "meterValueDelta")),
            ("update_frequency_seconds", field(state, "updateFrequencySeconds")),
            ("disabled", disabled(state)),
            ("reading_type", field(config, "reading")),
            ("measurement_type", field(config, "measurement")),
        ]),
        ..base
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn meter_unit(units: &str) -> Option<String> {
    let known = match units {
        "cloud.smarthq.type.meterunits.kwh" => "kWh",
        "cloud.smarthq.type.meterunits.kw" => "kW",
        "cloud.smarthq.type.meterunits.amps" => "A",
        "cloud.smarthq.type.meterunits.volts" => "V",
        "cloud.smarthq.type.meterunits.gallons" => "gal",
        "cloud.smarthq.type.meterunits.liters" => "L",
        other => return last_segment(other).map(str::to_owned),
    };
    Some(known.to_owned())
}

fn field(map: &Map<String, Value>, key: &str) -> Value {
    map.get(key).cloned().unwrap_or(Value::Null)
}

fn disabled(state: &Map<String, Value>) -> Value {
    Value::Bool(state.get("disabled").and_then(Value::as_bool).unwrap_or(false))
}

fn attributes<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

/// Text after the final `.`, if non-empty.
fn last_segment(dotted: &str) -> Option<&str> {
    dotted.rsplit('.').next().filter(|s| !s.is_empty())
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
