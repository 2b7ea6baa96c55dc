//! Axum HTTP adapter for the voice pipeline (§4.11).
//!
//! Depends only on `vocora-core`'s [`vocora_core::VoicePipelinePort`] trait
//! and its DTOs — never on `vocora-pipeline`'s internal types. The
//! composition root (`vocora-cli`) builds the concrete pipeline, erases it
//! to `Arc<dyn VoicePipelinePort>`, and hands it to [`bootstrap::start_server`].

mod error;
mod handlers;

pub mod bootstrap;
pub mod routes;
pub mod state;

pub use bootstrap::{start_server, HttpConfig};
pub use error::HttpError;
pub use routes::{create_router, CorsConfig};
pub use state::AppState;
