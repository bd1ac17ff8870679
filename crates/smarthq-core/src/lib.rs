//! Client and reactive data layer on top of `smarthq-api`.
//!
//! - **[`Client`]**: owns one event-stream connection.
//!   [`connect()`](Client::connect) authenticates, subscribes to the
//!   configured feeds, and spawns the frame reader and heartbeat. Drops
//!   are retried in the background with capped exponential backoff
//!   until [`disconnect()`](Client::disconnect).
//!
//! - **[`Registry`]**: device and service state built from stream
//!   messages. Lock-free lookups via `DashMap`, whole-collection
//!   snapshots via `tokio::sync::watch`.
//!
//! - **[`EventBus`]**: named fan-out of [`Event`]s to handlers, with
//!   per-handler failure isolation.
//!
//! - **Domain model** ([`model`]): [`Device`], [`Service`] and the
//!   closed [`ServiceType`] catalog.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{Client, ConnectionState};
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::CoreError;
pub use events::{
    Event, EventBus, EventHandler, EventKind, HandlerError, SubscriptionId, async_handler,
    sync_handler,
};
pub use model::{Device, Service, ServiceType};
pub use store::{Registry, Upsert};
