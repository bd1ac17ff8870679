//! Bridge status, recent events and the entity view.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::entities::{self, Entity};
use crate::event_log::LoggedEvent;

#[derive(Debug, Serialize)]
pub struct Info {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub connected: bool,
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub connected: bool,
    pub state: String,
    pub device_count: usize,
    pub service_count: usize,
}

/// `GET /`
pub async fn root(State(state): State<AppState>) -> Json<Info> {
    Json(Info {
        name: "SmartHQ Bridge",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        connected: state.client.is_connected(),
        region: state.region.to_string(),
    })
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let registry = state.client.registry();
    Json(Health {
        status: "healthy",
        connected: state.client.is_connected(),
        state: state.client.state().to_string(),
        device_count: registry.device_count(),
        service_count: registry.service_count(),
    })
}

/// `GET /events`, newest first.
pub async fn events(State(state): State<AppState>) -> Json<Vec<LoggedEvent>> {
    Json(state.events.recent())
}

/// `GET /entities`
pub async fn entities(State(state): State<AppState>) -> Json<Vec<Entity>> {
    Json(entities::from_registry(state.client.registry()))
}
