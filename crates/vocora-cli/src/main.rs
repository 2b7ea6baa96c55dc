//! CLI entry point — the composition root.
//!
//! Loads config, wires the pipeline orchestrator and the HTTP surface
//! (`vocora_core::ports`'s isolation rule means this is the only crate
//! that ever constructs both), runs the orchestrator's blocking main loop
//! on its own thread, and serves HTTP until Ctrl+C.

use std::sync::Arc;

use clap::Parser;

use vocora_cli::{bootstrap, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let ctx = match bootstrap(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "bootstrap failed");
            std::process::exit(1);
        }
    };

    let orchestrator = ctx.orchestrator;
    let handle = ctx.handle;
    let run_handle = Arc::clone(&orchestrator);
    let pipeline_thread = std::thread::Builder::new()
        .name("vocora-orchestrator".to_string())
        .spawn(move || run_handle.run())
        .expect("failed to spawn orchestrator thread");

    let stop_handle = handle.clone();
    let port = vocora_cli::bootstrap::as_port(handle);

    let server = tokio::spawn(vocora_http::start_server(port, ctx.http_config));

    tokio::select! {
        result = server => {
            if let Ok(Err(e)) = result {
                tracing::error!(error = %e, "http server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received Ctrl+C, shutting down");
        }
    }

    stop_handle.request_stop();
    let _ = pipeline_thread.join();

    Ok(())
}
