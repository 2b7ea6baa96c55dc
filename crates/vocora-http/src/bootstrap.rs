//! Server startup (§4.11). This is not a composition root — the pipeline
//! itself (backends, orchestrator, audio devices) is assembled by
//! `vocora-cli`; this module only turns an already-built `AppState` into
//! a listening HTTP server.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;

use crate::routes::{create_router, CorsConfig};
use crate::state::AppState;

/// Where the HTTP surface listens. The composition root translates
/// `vocora_pipeline::config::HttpConfig` (the serde-loadable form) into this
/// type, since this crate never depends on `vocora-pipeline`.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
    pub cors: CorsConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8741".parse().expect("valid default address"),
            max_body_bytes: 64 * 1024,
            cors: CorsConfig::default(),
        }
    }
}

/// Bind and serve. Runs until the listener errors or the process is
/// signalled to stop; the caller typically races this against a shutdown
/// future from the orchestrator side.
pub async fn start_server(state: AppState, config: HttpConfig) -> Result<()> {
    let app = create_router(state, &config.cors).layer(DefaultBodyLimit::max(config.max_body_bytes));
    let listener = TcpListener::bind(config.bind_addr).await?;

    tracing::info!(addr = %config.bind_addr, "vocora HTTP surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}
