//! Opsboard Web Server
//!
//! Axum-based server for the dashboard page, the REST API and the
//! notification channel, all on one listener.

pub mod hub;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    routing::{get, post},
    Router,
};
use opsboard_core::provider::{ProviderConfig, Providers};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use hub::{BroadcastHub, HubConfig, PeerId};
use state::AppState;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub: HubConfig,
    pub providers: ProviderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            hub: HubConfig::default(),
            providers: ProviderConfig::default(),
        }
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/peers", get(routes::peers::count))
        .route("/weather/{city}", get(routes::weather::current))
        .route("/weather/{city}/forecast", get(routes::weather::forecast))
        .route("/crypto", get(routes::crypto::markets))
        .route("/crypto/{id}/history", get(routes::crypto::history))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::dashboard::index))
        .nest("/api", api_routes)
        .route("/ws", get(websocket::ws_handler))
        .route("/internal/notify", post(routes::internal::notify))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until ctrl-c.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let hub = state.hub.clone();
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            hub.shutdown().await;
        })
        .await?;
    Ok(())
}

/// Run the web server.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(
        BroadcastHub::new(config.hub.clone()),
        Providers::from_config(&config.providers),
    );

    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on http://{}:{}", config.host, config.port);

    serve(listener, state).await
}
