//! JSON REST handlers for services.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use smarthq_core::{CoreError, Service};

use super::AppState;
use super::error::ApiError;

/// `GET /services`
pub async fn list(State(state): State<AppState>) -> Json<Arc<Vec<Arc<Service>>>> {
    Json(state.client.registry().services_snapshot())
}

/// `GET /services/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Arc<Service>>, ApiError> {
    let service = state
        .client
        .registry()
        .service_by_id(&id)
        .ok_or(CoreError::ServiceNotFound { identifier: id })?;
    Ok(Json(service))
}
