use serde::{Serialize, Serializer};
use strum::{Display, EnumString};

/// Value of the `kind` field on every frame.
///
/// The canonical vendor spelling is what gets serialized; the short
/// names are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MessageKind {
    // ── Inbound ──────────────────────────────────────────────────────
    #[strum(to_string = "websocket#pong", serialize = "pong")]
    Pong,
    #[strum(to_string = "websocket#connection", serialize = "connection-ack")]
    ConnectionAck,
    #[strum(
        to_string = "pubsub#command",
        serialize = "command-result",
        serialize = "command"
    )]
    CommandResult,
    #[strum(to_string = "pubsub#presence", serialize = "presence")]
    Presence,
    #[strum(to_string = "pubsub#device", serialize = "device")]
    Device,
    #[strum(to_string = "pubsub#alert", serialize = "alert")]
    Alert,
    #[strum(to_string = "pubsub#service", serialize = "service")]
    Service,

    // ── Outbound only ────────────────────────────────────────────────
    #[strum(to_string = "websocket#ping", serialize = "ping")]
    Ping,
    #[strum(to_string = "websocket#pubsub", serialize = "pubsub")]
    Pubsub,
    #[strum(to_string = "websocket#api", serialize = "api")]
    Api,
    #[strum(to_string = "user#pubsub")]
    UserPubsub,
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
