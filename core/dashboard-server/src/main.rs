//! Claude dashboard server entrypoint.
//!
//! Two listeners share one context: the HTTP listener serves the UI, the
//! state documents and the JSON APIs; the WebSocket listener pushes a full
//! snapshot to every client whenever a state document changes.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dashboard_core::StateDocument;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

mod broadcast;
mod config;
mod context;
mod launcher;
mod logging;
mod routes;
mod sidecar;
mod static_files;
mod watcher;

use config::{Cli, ServerConfig};
use context::{ServerContext, SharedContext};
use launcher::SystemLauncher;
use sidecar::SidecarClient;
use watcher::ChangeWatcher;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_cli(Cli::parse());
    let log_dir = config.as_ref().ok().map(|config| config.storage.server_log_dir());
    let _log_guard = logging::init(log_dir.as_deref());

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to resolve dashboard home");
            std::process::exit(1);
        }
    };

    let sidecar = match SidecarClient::new(config.sidecar_url.clone(), config.sidecar_timeout) {
        Ok(sidecar) => sidecar,
        Err(err) => {
            error!(error = %err, "Failed to build claude-mem client");
            std::process::exit(1);
        }
    };

    let ctx: SharedContext = Arc::new(ServerContext::new(config, Arc::new(SystemLauncher), sidecar));
    start_watching(&ctx);

    let http_listener = bind(ctx.config.http_addr, "HTTP").await;
    let ws_listener = bind(ctx.config.ws_addr, "WebSocket").await;

    info!(
        http = %ctx.config.http_addr,
        ws = %ctx.config.ws_addr,
        root = %ctx.storage().root().display(),
        "Claude dashboard server started"
    );

    let http = axum::serve(http_listener, routes::build_router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let ws = axum::serve(ws_listener, routes::build_live_router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    let (http_result, ws_result) = tokio::join!(http, ws);
    if let Err(err) = http_result {
        error!(error = %err, "HTTP listener failed");
    }
    if let Err(err) = ws_result {
        error!(error = %err, "WebSocket listener failed");
    }
    info!("Claude dashboard server stopped");
}

async fn bind(addr: SocketAddr, name: &str) -> TcpListener {
    match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %addr, listener = name, "Failed to bind listener");
            std::process::exit(1);
        }
    }
}

/// Watches both state documents and forwards changes to the broadcaster.
/// A watcher that cannot start only costs live updates for external edits;
/// saves made through HTTP still broadcast.
fn start_watching(ctx: &SharedContext) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let targets = StateDocument::ALL
        .into_iter()
        .map(|document| (document, ctx.store.path(document)))
        .collect();

    match ChangeWatcher::start(targets, sender) {
        Ok(watcher) => {
            info!(files = watcher.watched().len(), "Watching state documents");
            ctx.install_watcher(watcher);
        }
        Err(err) => error!(error = %err, "Failed to start state document watcher"),
    }

    tokio::spawn(broadcast::run_change_loop(Arc::clone(&ctx.broadcaster), receiver));
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
