// Outbound frame construction.

use serde::Serialize;
use serde_json::Value;

use super::kind::MessageKind;
use crate::error::Error;

/// Seconds the vendor waits for an appliance acknowledgement.
const ACK_TIMEOUT_SECS: u32 = 10;

/// Which pub/sub feeds the server should push to this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PubsubTopics {
    pub alerts: bool,
    pub services: bool,
    pub presence: bool,
    pub commands: bool,
}

impl Default for PubsubTopics {
    fn default() -> Self {
        Self {
            alerts: true,
            services: true,
            presence: true,
            commands: true,
        }
    }
}

/// Subscription configuration, sent once right after the socket opens.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub kind: MessageKind,
    pub action: &'static str,
    pub pubsub: bool,
    #[serde(flatten)]
    pub topics: PubsubTopics,
}

impl SubscriptionRequest {
    pub fn new(topics: PubsubTopics) -> Self {
        Self {
            kind: MessageKind::Pubsub,
            action: "pubsub",
            pubsub: true,
            topics,
        }
    }
}

/// Application-level keep-alive.
#[derive(Debug, Clone, Serialize)]
pub struct PingRequest {
    pub kind: MessageKind,
    pub id: String,
    pub action: &'static str,
}

impl PingRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Ping,
            id: id.into(),
            action: "ping",
        }
    }
}

/// Appliance control payload carried inside an [`ApiRequest`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBody {
    pub kind: &'static str,
    pub user_id: Option<String>,
    pub appliance_id: String,
    pub command: String,
    pub data: Vec<Value>,
    pub ack_timeout: u32,
    pub delay: u32,
}

/// A REST call tunnelled over the event stream.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    pub kind: MessageKind,
    pub action: &'static str,
    pub host: String,
    pub method: &'static str,
    pub path: String,
    pub id: String,
    pub body: ControlBody,
}

impl ApiRequest {
    /// Build an appliance control command.
    pub fn control(
        host: impl Into<String>,
        id: impl Into<String>,
        user_id: Option<String>,
        device_id: &str,
        command: &str,
        data: Vec<Value>,
    ) -> Self {
        Self {
            kind: MessageKind::Api,
            action: "api",
            host: host.into(),
            method: "POST",
            path: format!("/v1/appliance/{device_id}/control/{command}"),
            id: id.into(),
            body: ControlBody {
                kind: "appliance#control",
                user_id,
                appliance_id: device_id.to_owned(),
                command: command.to_owned(),
                data,
                ack_timeout: ACK_TIMEOUT_SECS,
                delay: 0,
            },
        }
    }
}

/// Serialize an outbound message into a text frame.
///
/// # Errors
///
/// Returns [`Error::Encode`] if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(message)?)
}
