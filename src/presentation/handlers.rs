// HTTP request handlers
use crate::application::device_gateway::RelayError;
use crate::application::session::PushEvent;
use crate::domain::device::{CommandReply, StepDirection};
use crate::infrastructure::chunked_json::stream_from_broadcast;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub direction: StepDirection,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current charts, axis ranges and labels
pub async fn dashboard_snapshot(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.session.snapshot().await {
        Ok(snapshot) => match json_response(&snapshot, accepts_brotli(&headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!("Snapshot unavailable: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Deliver one push event and answer with its acknowledgement
pub async fn push_event(State(state): State<Arc<AppState>>, Json(event): Json<PushEvent>) -> Response {
    match state.session.deliver_with_ack(event).await {
        Ok(ack) => Json(ack).into_response(),
        Err(e) => {
            tracing::error!("Push event dropped: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Live stream of view events (redraws, labels, controls, alerts)
pub async fn event_stream(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_broadcast(state.view.subscribe(), accepts_brotli(&headers)).await
}

pub async fn toggle_device(Path(device): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    relay_response(state.relay.send_toggle(&device).await)
}

pub async fn set_device_speed(
    Path(device): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeedRequest>,
) -> Response {
    relay_response(state.relay.send_speed(&device, request.speed).await)
}

pub async fn step_device_speed(
    Path(device): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<StepRequest>,
) -> Response {
    relay_response(state.relay.step_speed(&device, request.direction).await)
}

/// Mirror the device server's `{status, state|error}` shape back to the caller.
fn relay_response(result: Result<CommandReply, RelayError>) -> Response {
    match result {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            let status = match &e {
                RelayError::UnknownDevice(_) => StatusCode::NOT_FOUND,
                RelayError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RelayError::Transport(_) | RelayError::Http { .. } => StatusCode::BAD_GATEWAY,
            };
            (status, Json(json!({ "status": "error", "error": e.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::command_relay::{DeviceCommandRelay, RelaySettings};
    use crate::application::device_gateway::testing::FakeGateway;
    use crate::application::ingestion_service::DashboardController;
    use crate::application::session::spawn_session;
    use crate::domain::axis::AxisSettings;
    use crate::domain::dashboard::SensorSettings;
    use crate::infrastructure::broadcast_view::BroadcastView;
    use crate::infrastructure::push_client::NoUpstream;
    use axum::body::to_bytes;
    use serde_json::Value;

    fn app_state() -> (Arc<AppState>, Arc<FakeGateway>) {
        let view = BroadcastView::new(16);
        let controller = DashboardController::new(
            SensorSettings::default(),
            &AxisSettings::default(),
            Arc::new(view.clone()),
        );
        let (session, _task) = spawn_session(controller, Arc::new(NoUpstream));
        let gateway = Arc::new(FakeGateway::default());
        let relay = DeviceCommandRelay::new(gateway.clone(), Arc::new(view.clone()), RelaySettings::default());
        (Arc::new(AppState { session, relay, view }), gateway)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_push_event_returns_ack() {
        let (state, _gateway) = app_state();
        let event = PushEvent::UpdateDashboard(json!({"timestamp": 10, "co2": 0.05}));

        let response = push_event(State(state.clone()), Json(event.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "accepted", "applied": 1, "rejected": 0}));

        let response = push_event(State(state), Json(event)).await;
        assert_eq!(body_json(response).await, json!({"status": "stale", "timestamp": 10.0}));
    }

    #[tokio::test]
    async fn test_snapshot_reflects_pushed_data() {
        let (state, _gateway) = app_state();
        push_event(
            State(state.clone()),
            Json(PushEvent::UpdateDashboard(json!({"timestamp": 10, "temperatures": [19.5, 999]}))),
        )
        .await;

        let response = dashboard_snapshot(HeaderMap::new(), State(state)).await;
        let snapshot = body_json(response).await;

        assert_eq!(snapshot["labels"]["temp1"], "19.5 °C");
        assert_eq!(snapshot["labels"]["temp2"], "Not connected");
        assert_eq!(snapshot["charts"][2]["chart"], "temperature");
        assert_eq!(snapshot["charts"][2]["range"], json!({"min": 13.0, "max": 21.0}));
    }

    #[tokio::test]
    async fn test_toggle_route_relays_command() {
        let (state, gateway) = app_state();

        let response = toggle_device(Path("pump".to_string()), State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "success"}));
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_failures_map_to_status_codes() {
        let (state, gateway) = app_state();

        let response = toggle_device(Path("toaster".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        gateway.push_reply(Err(RelayError::Transport("timed out".to_string())));
        let response = set_device_speed(Path("pump".to_string()), State(state), Json(SpeedRequest { speed: 55.0 })).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["status"], "error");
    }
}
