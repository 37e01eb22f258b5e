// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use incubator_dashboard::application::command_relay::DeviceCommandRelay;
use incubator_dashboard::application::ingestion_service::DashboardController;
use incubator_dashboard::application::session::{spawn_session, PushUpstream};
use incubator_dashboard::infrastructure::broadcast_view::BroadcastView;
use incubator_dashboard::infrastructure::config::load_dashboard_config;
use incubator_dashboard::infrastructure::http_gateway::HttpDeviceGateway;
use incubator_dashboard::infrastructure::push_client::{HttpPushClient, NoUpstream};
use incubator_dashboard::presentation::app_state::AppState;
use incubator_dashboard::presentation::handlers::{
    dashboard_snapshot, event_stream, health_check, push_event, set_device_speed, step_device_speed,
    toggle_device,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config().context("Failed to load dashboard configuration")?;

    // Create adapters (infrastructure layer)
    let view = BroadcastView::new(config.events.buffer);
    let gateway = Arc::new(HttpDeviceGateway::new(
        &config.device_server.base_url,
        config.device_server.timeout(),
    )?);
    let push_client = config.push.url.as_deref().map(|url| {
        HttpPushClient::new(url, config.push.reconnect_delay(), config.push.compressed)
    });
    let upstream: Arc<dyn PushUpstream> = match &push_client {
        Some(client) => Arc::new(client.clone()),
        None => Arc::new(NoUpstream),
    };

    // Create services (application layer)
    let controller = DashboardController::new(config.sensors.clone(), &config.axis, Arc::new(view.clone()));
    let (session, _session_task) = spawn_session(controller, upstream);
    let relay = DeviceCommandRelay::new(gateway, Arc::new(view.clone()), config.relay.clone());

    if let Some(client) = push_client {
        tokio::spawn(client.run(session.clone()));
    } else {
        tracing::info!("No push URL configured; accepting events on POST /push only");
    }

    // Create application state
    let state = Arc::new(AppState {
        session,
        relay,
        view,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(dashboard_snapshot))
        .route("/events", get(event_stream))
        .route("/push", post(push_event))
        .route("/api/devices/:id/toggle", post(toggle_device))
        .route("/api/devices/:id/speed", post(set_device_speed))
        .route("/api/devices/:id/step", post(step_device_speed))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting incubator-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
