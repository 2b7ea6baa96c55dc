//! Route definitions and router construction (§4.11).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// CORS policy for the HTTP surface. The pipeline is a local-network
/// assistant, not a multi-tenant service, so the default is permissive;
/// callers that need to lock this down build their own `CorsLayer` and pass
/// it to [`crate::bootstrap::start_server`] instead.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    #[default]
    AllowAll,
    AllowOrigins(Vec<String>),
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Build the router. `state` is the already-constructed pipeline handle,
/// erased to the port trait object by the composition root.
pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .route("/command", post(handlers::command))
        .route("/speak", post(handlers::speak))
        .route("/wake", post(handlers::wake))
        .route("/status", get(handlers::status))
        .route("/tools", get(handlers::tools))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
