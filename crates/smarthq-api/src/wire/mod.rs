// ── Event-stream wire protocol ──
//
// Every frame is one JSON document with a `kind` discriminator.
// `kind` classifies it, `inbound` decodes what the server sends, and
// `outbound` builds what the client sends.

mod inbound;
mod kind;
mod outbound;
pub mod timestamp;

pub use inbound::{
    ConnectionAck, DeviceMessage, Inbound, PongMessage, Presence, PresenceMessage, ServiceMessage,
    decode,
};
pub use kind::MessageKind;
pub use outbound::{
    ApiRequest, ControlBody, PingRequest, PubsubTopics, SubscriptionRequest, encode,
};
