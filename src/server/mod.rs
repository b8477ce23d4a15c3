// SPDX-License-Identifier: GPL-3.0-only

//! Recording ingest server
//!
//! Serves the public directory and accepts WebM uploads from browser
//! recorders at `/record/<name>`. Uploads are saved with their duration
//! fixed so that players can seek in them.

pub mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

pub use routes::router;

/// How long in-flight uploads may take to finish after shutdown is requested
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// State shared by all request handlers
#[derive(Debug, Clone)]
pub struct ServerState {
    pub public_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ServerState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_dir: config.public_dir.clone(),
            recordings_dir: config.recordings_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Run the ingest server until Ctrl+C
///
/// Uses TLS when the configured certificate and key both exist, plain HTTP
/// otherwise.
pub async fn serve(config: Config) -> AppResult<()> {
    let addr = config.socket_addr()?;
    tokio::fs::create_dir_all(&config.recordings_dir).await?;

    let state = Arc::new(ServerState::from_config(&config));
    let app = router(state);

    match config.tls_paths() {
        Some((cert, key)) if cert.exists() && key.exists() => {
            let tls = RustlsConfig::from_pem_file(cert, key)
                .await
                .map_err(|e| AppError::Config(format!("TLS setup failed: {}", e)))?;
            serve_tls(app, addr, tls).await
        }
        Some((cert, key)) => {
            warn!(
                cert = %cert.display(),
                key = %key.display(),
                "TLS certificate or key not found, serving plain HTTP"
            );
            serve_plain(app, addr).await
        }
        None => serve_plain(app, addr).await,
    }
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: RustlsConfig) -> AppResult<()> {
    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!(%addr, "Listening on https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn serve_plain(app: Router, addr: SocketAddr) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
