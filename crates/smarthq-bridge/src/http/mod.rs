//! HTTP facade over the client's registry, event log and commands.

mod devices;
mod error;
mod services;
mod status;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use smarthq_core::Client;

use crate::event_log::EventLog;

/// Shared state for every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub events: Arc<EventLog>,
    pub region: Arc<str>,
}

/// Build the facade [`Router`] with permissive CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::root))
        .route("/health", get(status::health))
        .route("/devices", get(devices::list))
        .route("/devices/{id}", get(devices::get))
        .route("/devices/{id}/services", get(devices::services))
        .route("/devices/{id}/command", post(devices::command))
        .route("/services", get(services::list))
        .route("/services/{id}", get(services::get))
        .route("/events", get(status::events))
        .route("/entities", get(status::entities))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use smarthq_api::StaticTokenAuthenticator;
    use smarthq_api::memory::{MemoryPeer, MemoryTransport};
    use smarthq_core::ClientConfig;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tower::ServiceExt;
    use url::Url;

    use super::*;

    struct Fixture {
        state: AppState,
        peers: UnboundedReceiver<MemoryPeer>,
    }

    fn fixture() -> Fixture {
        let (transport, peers) = MemoryTransport::new();
        let client = Client::new(
            ClientConfig::new(Url::parse("wss://events.test").unwrap()),
            Arc::new(StaticTokenAuthenticator::new(SecretString::from(
                "tok".to_owned(),
            ))),
            Arc::new(transport),
        );
        let events = Arc::new(EventLog::new(10));
        events.attach(client.events());
        Fixture {
            state: AppState {
                client,
                events,
                region: Arc::from("US"),
            },
            peers,
        }
    }

    /// Connect, drain the subscription frame, and feed `frames`.
    async fn connected(fixture: &mut Fixture, frames: &[Value]) -> MemoryPeer {
        fixture.state.client.connect().await.unwrap();
        let mut peer = fixture.peers.recv().await.unwrap();
        peer.next_sent().await.unwrap();
        for frame in frames {
            peer.push(frame.to_string());
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        peer
    }

    fn oven() -> Value {
        json!({"kind": "pubsub#device", "deviceId": "d1", "deviceType": "oven", "name": "Range"})
    }

    fn temperature() -> Value {
        json!({
            "kind": "pubsub#service",
            "serviceId": "s1",
            "serviceType": "cloud.smarthq.service.temperature",
            "domainType": "cloud.smarthq.domain.oven.upper",
            "deviceId": "d1",
            "state": {"celsius": 180},
            "supportedCommands": ["set"]
        })
    }

    async fn call(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        call(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_command(state: &AppState, device: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::post(format!("/devices/{device}/command"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        call(state, request).await
    }

    #[tokio::test(start_paused = true)]
    async fn status_endpoints_before_connecting() {
        let fixture = fixture();

        let (status, root) = get(&fixture.state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(root["status"], "running");
        assert_eq!(root["connected"], false);
        assert_eq!(root["region"], "US");

        let (_, health) = get(&fixture.state, "/health").await;
        assert_eq!(
            health,
            json!({
                "status": "healthy",
                "connected": false,
                "state": "disconnected",
                "device_count": 0,
                "service_count": 0
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn devices_and_services_are_served_from_the_registry() {
        let mut fixture = fixture();
        let _peer = connected(&mut fixture, &[oven(), temperature()]).await;
        let state = &fixture.state;

        let (status, devices) = get(state, "/devices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(devices.as_array().unwrap().len(), 1);

        let (_, device) = get(state, "/devices/d1").await;
        assert_eq!(device["device_id"], "d1");
        assert_eq!(device["name"], "Range");
        assert_eq!(device["online"], false);
        assert_eq!(device["last_seen"], Value::Null);
        assert_eq!(device["services"]["s1"]["state"]["celsius"], 180);

        let (_, service) = get(state, "/services/s1").await;
        assert_eq!(service["service_type"], "cloud.smarthq.service.temperature");
        assert_eq!(service["state"]["celsius"], 180);
        assert_eq!(service["supported_commands"], json!(["set"]));

        let (_, owned) = get(state, "/devices/d1/services").await;
        assert_eq!(owned.as_array().unwrap().len(), 1);

        let (_, services) = get(state, "/services").await;
        assert_eq!(services.as_array().unwrap().len(), 1);

        let (_, health) = get(state, "/health").await;
        assert_eq!(health["connected"], true);
        assert_eq!(health["state"], "connected");
        assert_eq!(health["device_count"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_entities_are_404() {
        let fixture = fixture();
        for uri in ["/devices/missing", "/devices/missing/services", "/services/missing"] {
            let (status, body) = get(&fixture.state, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body["error"].as_str().unwrap().contains("not found"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn command_requires_connection_before_device_lookup() {
        let fixture = fixture();
        let (status, body) = post_command(&fixture.state, "missing", &json!({"command": "set"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "Not connected to SmartHQ"}));
    }

    #[tokio::test(start_paused = true)]
    async fn command_for_unknown_device_is_404() {
        let mut fixture = fixture();
        let _peer = connected(&mut fixture, &[]).await;
        let (status, _) = post_command(&fixture.state, "ghost", &json!({"command": "set"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn command_is_forwarded_with_its_correlation_id() {
        let mut fixture = fixture();
        let mut peer = connected(&mut fixture, &[oven()]).await;

        let request = json!({"command": "setTemperature", "data": [{"celsius": 200}]});
        let (status, body) = post_command(&fixture.state, "d1", &request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "command_sent");
        assert_eq!(body["device_id"], "d1");
        assert_eq!(body["data"], json!([{"celsius": 200}]));

        let sent: Value = serde_json::from_str(&peer.next_sent().await.unwrap()).unwrap();
        assert_eq!(sent["id"], body["correlation_id"]);
        assert_eq!(sent["path"], "/v1/appliance/d1/control/setTemperature");
    }

    #[tokio::test(start_paused = true)]
    async fn events_and_entities_reflect_the_stream() {
        let mut fixture = fixture();
        let _peer = connected(&mut fixture, &[oven(), temperature()]).await;

        let (_, events) = get(&fixture.state, "/events").await;
        let names: Vec<&str> = events
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["service_updated", "device_added", "connected"]);

        let (_, entities) = get(&fixture.state, "/entities").await;
        assert_eq!(
            entities[0]["entity_id"], "smarthq_d1_temp",
            "unexpected entities: {entities}"
        );
        assert_eq!(entities[0]["state"], 180.0);
    }

    #[tokio::test(start_paused = true)]
    async fn cors_allows_any_origin() {
        let fixture = fixture();
        let request = Request::get("/health")
            .header(header::ORIGIN, "http://homeassistant.local:8123")
            .body(Body::empty())
            .unwrap();
        let response = router(fixture.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
