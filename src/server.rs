//! HTTP front end: start a harvest, download its file.
//!
//! - `POST /scopus/data` runs one harvest and returns the file name
//! - `GET /scopus/download/{filename}` returns a produced RIS file
//! - `GET /health`

use crate::pipeline::Harvester;
use crate::query::HarvestRequest;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Origin of the bundled web form
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Names the download route will serve
static RIS_FILENAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*\.ris$").ok());

/// Shared server state
pub struct AppState {
    harvester: Harvester,
    /// One harvest at a time
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(harvester: Harvester) -> Self {
        Self {
            harvester,
            run_lock: Mutex::new(()),
        }
    }
}

/// Build the router with CORS for `origin`.
pub fn router(state: Arc<AppState>, origin: &str) -> crate::Result<Router> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| crate::ScopusError::Config(format!("invalid CORS origin: {}", origin)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/scopus/data", post(data_handler))
        .route("/scopus/download/{filename}", get(download_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Harvest response body
#[derive(Debug, Serialize)]
struct DataResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
}

async fn data_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<HarvestRequest>, JsonRejection>,
) -> (StatusCode, Json<DataResponse>) {
    let failed = || {
        (
            StatusCode::BAD_REQUEST,
            Json(DataResponse {
                message: "Failed to generate data. Check parameters.".to_string(),
                filename: None,
            }),
        )
    };

    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            warn!(error = %e, "Unreadable harvest request");
            return failed();
        }
    };

    let query = match req.to_query() {
        Ok(query) => query,
        Err(e) => {
            warn!(request = ?req, error = %e, "Rejected harvest request");
            return failed();
        }
    };

    let _guard = state.run_lock.lock().await;
    info!(selection = %query, "Harvest requested");
    match state.harvester.run(&query).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(DataResponse {
                message: "Data received successfully".to_string(),
                filename: Some(outcome.filename),
            }),
        ),
        Err(e) => {
            error!(selection = %query, error = %e, "Harvest failed");
            failed()
        }
    }
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    let allowed = RIS_FILENAME
        .as_ref()
        .is_some_and(|re| re.is_match(&filename) && !filename.contains(".."));
    if !allowed {
        warn!(filename = %filename, "Refused download");
        return (StatusCode::BAD_REQUEST, "invalid file name").into_response();
    }

    let path = state.harvester.config().output_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/x-research-info-systems".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "file not found").into_response()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Download failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
