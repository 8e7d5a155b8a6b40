use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, Result},
    github::{GitHubStore, RemoteStore},
    library::Library,
    types::{FileDescriptor, WriteOutcome},
};

/// Upstream response headers mirrored on document fetches; everything else
/// from upstream is dropped
const PASS_HEADERS: [&str; 5] = [
    "content-length",
    "content-range",
    "accept-ranges",
    "etag",
    "last-modified",
];

/// Shared application state passed to all route handlers
///
/// `library` is `None` when no repository identity is configured; every
/// repo-touching handler then fails closed with `BadConfig`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub library: Option<Arc<Library>>,
}

impl AppState {
    /// Build state from configuration, wiring the GitHub store when the
    /// repository identity is present
    pub fn from_config(config: Config) -> Self {
        let config = Arc::new(config);
        let library = config.identity().ok().map(|(owner, repo)| {
            let store: Arc<dyn RemoteStore> = Arc::new(GitHubStore::new(
                owner.to_string(),
                repo.to_string(),
                config.branch.clone(),
                config.token.clone(),
            ));
            Arc::new(Library::new(store, Arc::clone(&config)))
        });
        Self { config, library }
    }

    /// Build state over an injected store (tests)
    pub fn with_store(config: Config, store: Arc<dyn RemoteStore>) -> Self {
        let config = Arc::new(config);
        let library = Arc::new(Library::new(store, Arc::clone(&config)));
        Self {
            config,
            library: Some(library),
        }
    }

    fn library(&self) -> Result<&Arc<Library>> {
        self.library.as_ref().ok_or_else(|| ApiError::BadConfig {
            message: "Missing owner/repo".to_string(),
        })
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health))
        .route("/api/list", get(list_documents))
        .route("/api/upload", post(upload_document))
        .route("/api/pdf", get(fetch_document))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

/// GET /api/health — configuration presence, never upstream reachability
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "repo": state.config.repo_slug(),
        "branch": state.config.branch,
        "path": state.config.base_path,
        "configured": state.config.writable(),
    }))
}

/// GET /api/list — all documents on the configured branch
async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileDescriptor>>> {
    let files = state.library()?.list().await?;
    Ok(Json(files))
}

/// POST /api/upload — multipart form with a single `file` field
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<WriteOutcome>> {
    // Credential before identity, so a fully unconfigured server reports
    // the write-credential problem first
    if !state.config.writable() {
        return Err(ApiError::NotConfigured {
            message: "Missing GH_TOKEN on server".to_string(),
        });
    }
    let library = state.library()?;

    let mut payload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest {
            message: e.to_string(),
        })?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest {
                message: e.to_string(),
            })?;
            payload = Some((name, bytes));
            break;
        }
    }

    let (name, bytes) = payload.ok_or(ApiError::NoFile)?;
    let outcome = library.upload(bytes, &name).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct PdfQuery {
    #[serde(default)]
    path: String,
}

/// GET /api/pdf?path=... — stream raw bytes with inline-viewing headers
async fn fetch_document(
    State(state): State<AppState>,
    Query(query): Query<PdfQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let library = state.library()?;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    let doc = library.fetch_document(&query.path, range).await?;

    let status = StatusCode::from_u16(doc.status)
        .map_err(|_| ApiError::Internal(format!("invalid upstream status {}", doc.status)))?;
    let mut builder = Response::builder().status(status);

    for name in PASS_HEADERS {
        if let Some(value) = doc.header(name) {
            builder = builder.header(name, value);
        }
    }

    // Quote characters stripped so the filename cannot break out of the
    // Content-Disposition header
    let name = match crate::library::file_name(&query.path) {
        "" => "document.pdf".to_string(),
        n => n.replace('"', ""),
    };
    builder = builder
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", name),
        );

    let body = match doc.body {
        Some(stream) => Body::from_stream(stream),
        None => Body::empty(),
    };
    builder
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Unmatched routes — the browser client only knows `/api/*`
async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NotFound", "path": uri.path() })),
    )
        .into_response()
}
