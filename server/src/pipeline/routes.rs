//! HTTP route handlers for local ingestion

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::acquire::{AcquisitionError, Blob, BlobSource, DEFAULT_CONTENT_TYPE};
use crate::study::Study;

use super::route::RouteDirective;
use super::runner::IngestPipeline;
use super::types::PipelineError;

/// Application state containing the ingestion pipeline
#[derive(Clone)]
pub struct LocalAppState {
    pub pipeline: Arc<IngestPipeline>,
    /// Maximum accepted upload body in bytes
    pub max_upload_size: usize,
}

/// Error response for local ingestion API
#[derive(Debug, Serialize)]
pub struct LocalErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<PipelineError> for LocalErrorResponse {
    fn from(e: PipelineError) -> Self {
        let code = match &e {
            PipelineError::Acquisition(AcquisitionError::RemoteDisabled) => "remote_disabled",
            PipelineError::Acquisition(AcquisitionError::Upload(_)) => "upload_error",
            PipelineError::Acquisition(_) => "acquisition_error",
            PipelineError::Build(_) => "build_error",
        };
        Self {
            error: e.to_string(),
            code: code.to_string(),
        }
    }
}

impl From<AcquisitionError> for LocalErrorResponse {
    fn from(e: AcquisitionError) -> Self {
        PipelineError::from(e).into()
    }
}

impl IntoResponse for LocalErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "upload_error" => StatusCode::BAD_REQUEST,
            "remote_disabled" => StatusCode::SERVICE_UNAVAILABLE,
            "acquisition_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Query string of the remote trigger
#[derive(Debug, Deserialize)]
pub struct RelativePathQuery {
    /// Folder to ingest, relative to the content base; empty when absent
    #[serde(rename = "relativePath", default)]
    pub relative_path: String,
}

/// Navigation target returned to API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteResponse {
    pub target_path: String,
    pub study_ids: Vec<String>,
    pub data_source: String,
    /// Ready-to-follow navigation target
    pub location: String,
}

impl From<RouteDirective> for RouteResponse {
    fn from(route: RouteDirective) -> Self {
        let location = route.location();
        Self {
            target_path: route.target_path,
            study_ids: route.study_ids,
            data_source: route.data_source,
            location,
        }
    }
}

/// Collect every multipart part as a blob, without inspecting content
async fn read_blobs(mut multipart: Multipart) -> Result<Vec<Blob>, AcquisitionError> {
    let mut blobs = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AcquisitionError::Upload(e.to_string()))?
    {
        let name = field
            .file_name()
            .or(field.name())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("file-{}", blobs.len()));
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AcquisitionError::Upload(format!("{}: {}", name, e)))?;

        blobs.push(Blob::new(name, content_type, data));
    }

    Ok(blobs)
}

/// POST /api/local/files - Ingest uploaded files
pub async fn upload_files(
    State(state): State<LocalAppState>,
    multipart: Multipart,
) -> Result<Json<RouteResponse>, LocalErrorResponse> {
    let blobs = read_blobs(multipart).await.map_err(|e| {
        tracing::warn!("Rejected upload: {}", e);
        LocalErrorResponse::from(e)
    })?;
    tracing::info!("Received {} uploaded files", blobs.len());

    let route = state.pipeline.run(BlobSource::Direct(blobs)).await?;
    Ok(Json(route.into()))
}

/// GET /api/local/route?relativePath= - Ingest a remote folder
pub async fn remote_route(
    State(state): State<LocalAppState>,
    Query(query): Query<RelativePathQuery>,
) -> Result<Json<RouteResponse>, LocalErrorResponse> {
    let route = state
        .pipeline
        .run(BlobSource::Remote {
            relative_path: query.relative_path,
        })
        .await?;
    Ok(Json(route.into()))
}

/// GET /local?relativePath= - Ingest a remote folder and redirect to the viewer
pub async fn dispatch_remote(
    State(state): State<LocalAppState>,
    Query(query): Query<RelativePathQuery>,
) -> Result<Response, LocalErrorResponse> {
    let route = state
        .pipeline
        .run(BlobSource::Remote {
            relative_path: query.relative_path,
        })
        .await?;

    let location = route.location();
    let value = HeaderValue::from_str(&location).map_err(|e| {
        tracing::error!("Cannot dispatch to {:?}: {}", location, e);
        LocalErrorResponse {
            error: format!("Invalid navigation target: {}", e),
            code: "invalid_location".to_string(),
        }
    })?;

    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response())
}

/// GET /api/local/studies/:id - Read back a registered study
pub async fn get_study(
    State(state): State<LocalAppState>,
    Path(id): Path<String>,
) -> Result<Json<Study>, LocalErrorResponse> {
    state
        .pipeline
        .store()
        .get_study(&id)
        .map(Json)
        .ok_or_else(|| {
            tracing::debug!("Study not found: {}", id);
            LocalErrorResponse {
                error: format!("Study not found: {}", id),
                code: "not_found".to_string(),
            }
        })
}

/// Build local ingestion routes
pub fn local_routes(state: LocalAppState) -> Router {
    let limit = state.max_upload_size;
    Router::new()
        .route("/api/local/files", post(upload_files))
        .route("/api/local/route", get(remote_route))
        .route("/api/local/studies/:id", get(get_study))
        .route("/local", get(dispatch_remote))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}
