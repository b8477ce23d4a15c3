// SPDX-License-Identifier: MPL-2.0

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

use super::ServerState;
use crate::errors::{ServerError, StorageError};
use crate::storage::{recording_path, save_recording, upload_temp_path};
use crate::webm::fix_duration;

/// Create the router: static files at `/` and uploads at `/record/<name>`
pub fn router(state: Arc<ServerState>) -> Router {
    let public = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/record/", post(empty_name_handler).fallback(not_found))
        .route("/record/{*name}", post(record_handler).fallback(not_found))
        .fallback_service(public)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow any origin and header; answer preflight and HEAD requests directly
async fn cors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let mut response = if method == Method::OPTIONS || method == Method::HEAD {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn empty_name_handler() -> ServerErrorResponse {
    ServerError::Storage(StorageError::InvalidName(String::new())).into()
}

/// Saved recording summary returned to the uploader
#[derive(Debug, Serialize)]
struct RecordingSaved {
    name: String,
    /// URL path under the public directory, if the recording is served
    url: Option<String>,
    duration_ms: u64,
    truncated: bool,
}

/// Receive a WebM upload, fix its duration and save it
///
/// An upload interrupted by the client (page reload, closed tab) is still
/// processed up to the last complete element.
async fn record_handler(
    Path(name): Path<String>,
    State(state): State<Arc<ServerState>>,
    body: Body,
) -> Result<impl IntoResponse, ServerErrorResponse> {
    let target = recording_path(&state.recordings_dir, &name)?;
    let temp = upload_temp_path(&state.temp_dir);

    let received = match spool_upload(body, &temp, state.max_upload_bytes).await {
        Ok(received) => received,
        Err(e) => {
            remove_temp(&temp).await;
            return Err(e.into());
        }
    };

    let spooled = temp.clone();
    let fixed = tokio::task::spawn_blocking(move || -> Result<_, ServerError> {
        let data = std::fs::read(&spooled)?;
        Ok(fix_duration(&data)?)
    })
    .await;
    let fixed = match fixed {
        Ok(Ok(fixed)) => fixed,
        Ok(Err(e)) => {
            // Keep the raw upload around for manual recovery
            warn!(name = %name, temp = %temp.display(), error = %e, "Could not process recording");
            return Err(e.into());
        }
        Err(e) => {
            warn!(name = %name, temp = %temp.display(), error = %e, "Recording task failed");
            return Err(ServerError::Task(e.to_string()).into());
        }
    };

    save_recording(&target, &fixed.bytes).await?;
    remove_temp(&temp).await;

    let duration_ms = fixed.as_duration().as_millis() as u64;
    info!(
        name = %name,
        path = %target.display(),
        received,
        duration_ms,
        truncated = fixed.truncated,
        "Recording done"
    );

    let saved = RecordingSaved {
        url: public_url(&state.public_dir, &target),
        name,
        duration_ms,
        truncated: fixed.truncated,
    };
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Stream the request body into `temp`, returning the number of bytes written
async fn spool_upload(body: Body, temp: &FsPath, limit: usize) -> Result<usize, ServerError> {
    if let Some(parent) = temp.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(temp).await?;
    let mut received = 0usize;
    let mut stream = body.into_data_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                if received.saturating_add(chunk.len()) > limit {
                    return Err(ServerError::TooLarge(limit));
                }
                file.write_all(&chunk).await?;
                received += chunk.len();
            }
            Err(e) => {
                warn!(error = %e, received, "Upload interrupted, keeping partial data");
                break;
            }
        }
    }

    file.flush().await?;
    debug!(temp = %temp.display(), bytes = received, "Upload spooled");
    Ok(received)
}

async fn remove_temp(temp: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(temp = %temp.display(), error = %e, "Failed to remove upload temp file");
        }
    }
}

fn public_url(public_dir: &FsPath, target: &FsPath) -> Option<String> {
    let relative: PathBuf = target.strip_prefix(public_dir).ok()?.to_path_buf();
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

/// Error response wrapper for ServerError
pub struct ServerErrorResponse(ServerError);

impl From<ServerError> for ServerErrorResponse {
    fn from(e: ServerError) -> Self {
        ServerErrorResponse(e)
    }
}

impl From<StorageError> for ServerErrorResponse {
    fn from(e: StorageError) -> Self {
        ServerErrorResponse(ServerError::Storage(e))
    }
}

impl IntoResponse for ServerErrorResponse {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ServerError::Storage(StorageError::InvalidName(_)) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            ServerError::InvalidRecording(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            ServerError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.0.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };

        warn!("Recording upload error: {}", self.0);

        (status, message).into_response()
    }
}
