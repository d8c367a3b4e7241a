//! HTTP entry points of the sweep service
//!
//! ## Endpoints
//!
//! - `GET /check` - Run a sweep (`site` and `delay` query parameters)
//! - `POST /retry` - Schedule a deferred single-target recheck
//! - `GET /health` - Liveness

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{AcceptedResponse, CheckQuery, CheckResponse, HealthResponse, RetryPayload};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:3000")
    pub bind_addr: SocketAddr,

    /// Secret required on `POST /retry`
    pub internal_secret: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            internal_secret: None,
        }
    }
}

/// Build the router with all routes
pub fn router(state: ApiState, internal_secret: Option<String>) -> Router {
    let mut retry: Router<ApiState> = Router::new().route("/retry", post(routes::retry::schedule_retry));

    if let Some(secret) = internal_secret {
        retry = retry.route_layer(axum::middleware::from_fn_with_state(
            secret,
            middleware::auth::internal_secret_middleware,
        ));
    }

    Router::new()
        .route("/check", get(routes::check::run_check))
        .route("/health", get(routes::health::health_check))
        .merge(retry)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.internal_secret);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
