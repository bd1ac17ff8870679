// Inbound frame decoding.
//
// Decoding is two-staged: the frame is parsed into a JSON value and
// classified by `kind`, then the value is read into the typed shape for
// that kind. Each stage has its own error so the dispatcher can log
// precisely what was wrong with a discarded frame.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::kind::MessageKind;
use super::timestamp;
use crate::error::Error;

// ── Typed payloads ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PongMessage {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionAck {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    #[serde(default)]
    pub online: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub device_id: String,
    #[serde(default = "offline")]
    pub presence: Presence,
}

fn offline() -> Presence {
    Presence {
        online: false,
        last_seen: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMessage {
    pub device_id: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A `pubsub#service` frame.
///
/// `service_type` is left as the raw vendor string; mapping it onto the
/// closed set of known types happens in the domain layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMessage {
    pub service_id: String,
    pub service_type: String,
    #[serde(default)]
    pub domain_type: String,
    pub device_id: String,
    #[serde(default)]
    pub state: Map<String, Value>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub supported_commands: Vec<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_state_time: Option<DateTime<Utc>>,
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Pong(PongMessage),
    ConnectionAck(ConnectionAck),
    /// Result of an earlier command; not correlated, passed on raw.
    CommandResult(Value),
    Presence(PresenceMessage),
    Device(DeviceMessage),
    Alert(Value),
    /// Typed view plus the untouched payload, which the device cache keeps.
    Service {
        message: ServiceMessage,
        raw: Value,
    },
    /// A recognised kind that carries nothing for the client.
    Ignored(MessageKind),
}

/// Decode one text frame.
///
/// # Errors
///
/// - [`Error::MalformedFrame`] if the text is not a JSON object.
/// - [`Error::UnknownKind`] if `kind` is missing or unrecognised.
/// - [`Error::Decode`] if the payload does not fit its kind.
pub fn decode(text: &str) -> Result<Inbound, Error> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::MalformedFrame {
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(Error::MalformedFrame {
            message: "expected a JSON object".into(),
        });
    }

    let raw_kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::UnknownKind(String::new()))?;
    let kind =
        MessageKind::from_str(raw_kind).map_err(|_| Error::UnknownKind(raw_kind.to_owned()))?;

    Ok(match kind {
        MessageKind::Pong => Inbound::Pong(typed(kind, &value)?),
        MessageKind::ConnectionAck => Inbound::ConnectionAck(typed(kind, &value)?),
        MessageKind::CommandResult => Inbound::CommandResult(value),
        MessageKind::Presence => Inbound::Presence(typed(kind, &value)?),
        MessageKind::Device => Inbound::Device(typed(kind, &value)?),
        MessageKind::Alert => Inbound::Alert(value),
        MessageKind::Service => Inbound::Service {
            message: typed(kind, &value)?,
            raw: value,
        },
        MessageKind::Ping | MessageKind::Pubsub | MessageKind::Api | MessageKind::UserPubsub => {
            Inbound::Ignored(kind)
        }
    })
}

fn typed<T: DeserializeOwned>(kind: MessageKind, value: &Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|e| Error::Decode {
        kind: kind.to_string(),
        message: e.to_string(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_device() {
        let frame = r#"{"kind":"pubsub#device","deviceId":"d1","deviceType":"oven","name":"Kitchen"}"#;
        assert_eq!(
            decode(frame).unwrap(),
            Inbound::Device(DeviceMessage {
                device_id: "d1".into(),
                device_type: "oven".into(),
                name: Some("Kitchen".into()),
            })
        );
    }

    #[test]
    fn short_kind_names_are_accepted() {
        let frame = r#"{"kind":"device","deviceId":"d1"}"#;
        let Inbound::Device(msg) = decode(frame).unwrap() else {
            panic!("expected device");
        };
        assert_eq!(msg.device_type, "");
        assert_eq!(msg.name, None);
    }

    #[test]
    fn decodes_presence_with_z_timestamp() {
        let frame = r#"{"kind":"pubsub#presence","deviceId":"d1",
            "presence":{"online":true,"lastSeen":"2024-01-01T00:00:00Z"}}"#;
        let Inbound::Presence(msg) = decode(frame).unwrap() else {
            panic!("expected presence");
        };
        assert!(msg.presence.online);
        assert_eq!(
            msg.presence.last_seen,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn presence_without_payload_is_offline() {
        let Inbound::Presence(msg) = decode(r#"{"kind":"presence","deviceId":"d1"}"#).unwrap()
        else {
            panic!("expected presence");
        };
        assert!(!msg.presence.online);
        assert_eq!(msg.presence.last_seen, None);
    }

    #[test]
    fn decodes_service_and_keeps_raw() {
        let raw = json!({
            "kind": "pubsub#service",
            "serviceId": "s1",
            "serviceType": "cloud.smarthq.service.temperature",
            "domainType": "cloud.smarthq.domain.oven.upper",
            "deviceId": "d1",
            "state": {"celsius": 180},
            "supportedCommands": ["set"],
            "lastSyncTime": "2024-01-01T00:00:00Z"
        });
        let Inbound::Service { message, raw: kept } = decode(&raw.to_string()).unwrap() else {
            panic!("expected service");
        };
        assert_eq!(message.service_id, "s1");
        assert_eq!(message.state.get("celsius"), Some(&json!(180)));
        assert!(message.config.is_empty());
        assert_eq!(message.supported_commands, vec!["set".to_owned()]);
        assert_eq!(message.last_state_time, None);
        assert_eq!(kept, raw);
    }

    #[test]
    fn connection_ack_captures_user_id() {
        let Inbound::ConnectionAck(ack) =
            decode(r#"{"kind":"websocket#connection","userId":"u-42"}"#).unwrap()
        else {
            panic!("expected ack");
        };
        assert_eq!(ack.user_id.as_deref(), Some("u-42"));
    }

    #[test]
    fn alert_and_command_result_are_raw() {
        let alert = decode(r#"{"kind":"pubsub#alert","alertType":"door"}"#).unwrap();
        assert!(matches!(alert, Inbound::Alert(v) if v["alertType"] == "door"));
        let result = decode(r#"{"kind":"pubsub#command","success":true}"#).unwrap();
        assert!(matches!(result, Inbound::CommandResult(v) if v["success"] == true));
    }

    #[test]
    fn outbound_kinds_are_ignored() {
        assert_eq!(
            decode(r#"{"kind":"websocket#ping","id":"1"}"#).unwrap(),
            Inbound::Ignored(MessageKind::Ping)
        );
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            decode("not json"),
            Err(Error::MalformedFrame { .. })
        ));
        assert!(matches!(decode("[1,2]"), Err(Error::MalformedFrame { .. })));
    }

    #[test]
    fn unknown_or_missing_kind() {
        assert!(matches!(
            decode(r#"{"kind":"pubsub#weather"}"#),
            Err(Error::UnknownKind(k)) if k == "pubsub#weather"
        ));
        assert!(matches!(
            decode(r#"{"deviceId":"d1"}"#),
            Err(Error::UnknownKind(k)) if k.is_empty()
        ));
    }

    #[test]
    fn bad_shape_is_decode_error() {
        assert!(matches!(
            decode(r#"{"kind":"pubsub#device"}"#),
            Err(Error::Decode { kind, .. }) if kind == "pubsub#device"
        ));
        assert!(matches!(
            decode(r#"{"kind":"pubsub#presence","deviceId":"d1","presence":{"lastSeen":"soon"}}"#),
            Err(Error::Decode { .. })
        ));
    }
}
