//! JSON REST handlers for devices and command submission.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use smarthq_core::{CoreError, Device, Service};

use super::AppState;
use super::error::ApiError;

/// Request body for `POST /devices/{id}/command`.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct CommandSent {
    pub status: &'static str,
    pub device_id: String,
    pub command: String,
    pub data: Vec<Value>,
    pub correlation_id: Uuid,
}

/// `GET /devices`
pub async fn list(State(state): State<AppState>) -> Json<Arc<Vec<Arc<Device>>>> {
    Json(state.client.registry().devices_snapshot())
}

/// `GET /devices/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Arc<Device>>, ApiError> {
    let device = state
        .client
        .registry()
        .device_by_id(&id)
        .ok_or(CoreError::DeviceNotFound { identifier: id })?;
    Ok(Json(device))
}

/// `GET /devices/{id}/services`
pub async fn services(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Arc<Service>>>, ApiError> {
    let registry = state.client.registry();
    if registry.device_by_id(&id).is_none() {
        return Err(CoreError::DeviceNotFound { identifier: id }.into());
    }
    Ok(Json(registry.services_for_device(&id)))
}

/// `POST /devices/{id}/command`
///
/// Connection state is checked before the device lookup, so a bridge
/// that is offline answers 503 even for unknown ids.
pub async fn command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandSent>, ApiError> {
    if !state.client.is_connected() {
        return Err(CoreError::NotConnected.into());
    }
    if state.client.registry().device_by_id(&id).is_none() {
        return Err(CoreError::DeviceNotFound { identifier: id }.into());
    }

    let correlation_id = state
        .client
        .send_command(&id, &request.command, request.data.clone())
        .await?;

    Ok(Json(CommandSent {
        status: "command_sent",
        device_id: id,
        command: request.command,
        data: request.data,
        correlation_id,
    }))
}
