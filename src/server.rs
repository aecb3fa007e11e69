//! HTTP server.
//!
//! A thin axum router over [`FileIndex`]. Directory scans run on the
//! blocking pool; each request rescans the folders, so there is no shared
//! mutable state between handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Host page, served verbatim from the templates folder |
//! | `GET`  | `/health` | Folder and template diagnostics |
//! | `GET`  | `/api/files?q=` | Base names matching `q` with per-category availability |
//! | `GET`  | `/download/{file_type}/{filename}` | Download one variant as an attachment |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "File not found" } }
//! ```
//!
//! Error codes: `not_found` (404), `internal` (500).

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::IndexError;
use crate::index::FileIndex;
use crate::models::{HealthReport, SearchResults};

/// Handler state; the index is immutable, so sharing it needs no lock.
#[derive(Clone)]
struct AppState {
    /// Folder index (wrapped in `Arc` for cheap cloning into blocking tasks).
    index: Arc<FileIndex>,
}

/// Starts the HTTP server.
///
/// Resolves the folder layout, creates missing category folders when
/// `[folders].create_missing` is set, then binds `[server].bind` and serves
/// until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let index = FileIndex::new(config.layout()?);
    if config.folders.create_missing {
        index.ensure_folders()?;
    }

    let app = router(index);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with all routes, CORS and request tracing.
pub fn router(index: FileIndex) -> Router {
    let state = AppState {
        index: Arc::new(index),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/files", get(handle_files))
        .route("/download/{file_type}/{filename}", get(handle_download))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"not_found"` or `"internal"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Error returned by handlers, rendered as the JSON error envelope.
struct AppError {
    status: StatusCode,
    /// Machine-readable error code, copied into [`ErrorDetail::code`].
    code: String,
    /// Human-readable detail passed through to the client.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotFound(msg) => not_found(msg),
            IndexError::Internal(msg) => {
                warn!(error = %msg, "request failed");
                internal(msg)
            }
        }
    }
}

/// Runs a blocking index call off the async executor.
async fn blocking<T, F>(index: &Arc<FileIndex>, f: F) -> Result<T, IndexError>
where
    T: Send + 'static,
    F: FnOnce(&FileIndex) -> Result<T, IndexError> + Send + 'static,
{
    let index = index.clone();
    tokio::task::spawn_blocking(move || f(&index)).await?
}

// ============ GET / ============

async fn handle_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let page = blocking(&state.index, |index| index.index_page()).await?;
    Ok(Html(page))
}

// ============ GET /health ============

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthReport>, AppError> {
    let report = blocking(&state.index, |index| index.health()).await?;
    Ok(Json(report))
}

// ============ GET /api/files ============

#[derive(Deserialize)]
struct FilesQuery {
    /// Search text; absent means "list everything".
    #[serde(default)]
    q: String,
}

/// Handler for `GET /api/files`.
///
/// Returns every base name whose lower-cased form contains the trimmed,
/// lower-cased `q`; a missing or blank `q` returns the whole listing.
async fn handle_files(
    State(state): State<AppState>,
    Query(params): Query<FilesQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let results = blocking(&state.index, move |index| index.search(&params.q)).await?;
    Ok(Json(results))
}

// ============ GET /download/{file_type}/{filename} ============

/// Handler for `GET /download/{file_type}/{filename}`.
///
/// Resolves the file first so misses keep the JSON error envelope, then
/// hands the request to [`ServeFile`], which streams the body and honours
/// `Range` and conditional headers. The response carries an attachment
/// disposition so browsers save it under its on-disk name.
async fn handle_download(
    State(state): State<AppState>,
    Path((file_type, filename)): Path<(String, String)>,
    request: Request,
) -> Result<Response, AppError> {
    let download = blocking(&state.index, move |index| {
        index.resolve_download(&file_type, &filename)
    })
    .await?;

    let disposition = HeaderValue::from_str(&content_disposition(&download.file_name))
        .map_err(|e| internal(e.to_string()))?;

    let response = ServeFile::new(&download.path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    if response.status() == StatusCode::NOT_FOUND {
        // Removed between resolution and open.
        return Err(not_found("File not found"));
    }

    info!(category = %download.category, file = %download.file_name, status = %response.status(), "download");

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// `attachment` disposition with an ASCII `filename` fallback and an
/// RFC 5987 `filename*` carrying the exact UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
