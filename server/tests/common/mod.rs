//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::tags;
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicomlocal_server::study::BuildError;
use dicomlocal_server::{
    Blob, DicomStudyBuilder, IngestPipeline, LocalAppState, MetadataStore, RemoteAcquirer,
    RoutingConfig, StudyBuilder, local_routes,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Application setup
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routing with the microscopy capability toggled
pub fn routing(microscopy_available: bool) -> RoutingConfig {
    RoutingConfig {
        microscopy_available,
        ..RoutingConfig::default()
    }
}

/// Create app state around the given builder, optionally with a remote source
pub fn create_test_state(
    builder: Arc<dyn StudyBuilder>,
    routing: RoutingConfig,
    remote: Option<RemoteAcquirer>,
) -> LocalAppState {
    let mut pipeline = IngestPipeline::new(builder, Arc::new(MetadataStore::new()), routing);
    if let Some(remote) = remote {
        pipeline = pipeline.with_remote(remote);
    }
    LocalAppState {
        pipeline: Arc::new(pipeline),
        max_upload_size: 16 * 1024 * 1024,
    }
}

/// Create a test application router for the given state
pub fn create_test_app(state: LocalAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(local_routes(state))
}

// ============================================================================
// Recording builder
// ============================================================================

/// Wraps the DICOM builder and records the blobs of every build call
#[derive(Default)]
pub struct RecordingBuilder {
    inner: DicomStudyBuilder,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// (name, content type) of each blob, per call
    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudyBuilder for RecordingBuilder {
    async fn build(
        &self,
        blobs: Vec<Blob>,
        store: &MetadataStore,
    ) -> Result<Vec<String>, BuildError> {
        self.calls.lock().unwrap().push(
            blobs
                .iter()
                .map(|b| (b.name.clone(), b.content_type.clone()))
                .collect(),
        );
        self.inner.build(blobs, store).await
    }
}

// ============================================================================
// DICOM fixtures
// ============================================================================

/// Encode a minimal Part 10 file carrying the given UIDs
pub fn dicom_bytes(study: &str, series: &str, sop: &str, modality: Option<&str>) -> Vec<u8> {
    const SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.7";

    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(SOP_CLASS_UID),
    ));
    obj.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop),
    ));
    obj.put(DataElement::new(
        tags::STUDY_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(study),
    ));
    obj.put(DataElement::new(
        tags::SERIES_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(series),
    ));
    if let Some(modality) = modality {
        obj.put(DataElement::new(
            tags::MODALITY,
            VR::CS,
            PrimitiveValue::from(modality),
        ));
    }

    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax("1.2.840.10008.1.2.1")
                .media_storage_sop_class_uid(SOP_CLASS_UID)
                .media_storage_sop_instance_uid(sop),
        )
        .expect("Failed to build file meta group");

    let mut buffer = Vec::new();
    file.write_all(&mut buffer)
        .expect("Failed to encode DICOM fixture");
    buffer
}

/// Build a multipart/form-data body; returns (content type, body)
pub fn multipart_body(files: &[(&str, Vec<u8>)]) -> (String, Vec<u8>) {
    let boundary = "dicomlocal-test-boundary";
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/dicom\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

// ============================================================================
// Remote file server
// ============================================================================

#[derive(Default)]
struct FileServerState {
    /// relative path -> listing
    listings: HashMap<String, Vec<String>>,
    /// "<relative path>/<name>" -> bytes
    files: HashMap<String, Vec<u8>>,
    listing_status: Option<StatusCode>,
    raw_listing: Option<String>,
    listing_requests: AtomicUsize,
    file_requests: AtomicUsize,
}

/// A file listing + content host bound to a random local port
pub struct TestFileServer {
    pub addr: SocketAddr,
    state: Arc<FileServerState>,
}

/// Builder for [`TestFileServer`]
#[derive(Default)]
pub struct FileServerBuilder {
    state: FileServerState,
}

impl FileServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a folder: listing plus file contents
    pub fn folder(mut self, relative_path: &str, files: Vec<(&str, Vec<u8>)>) -> Self {
        let names = files.iter().map(|(n, _)| n.to_string()).collect();
        self.state.listings.insert(relative_path.to_string(), names);
        for (name, data) in files {
            self.state
                .files
                .insert(format!("{}/{}", relative_path, name), data);
        }
        self
    }

    /// List a file without serving it (fetch returns 404)
    pub fn listed_only(mut self, relative_path: &str, name: &str) -> Self {
        self.state
            .listings
            .entry(relative_path.to_string())
            .or_default()
            .push(name.to_string());
        self
    }

    /// Make every listing request answer with `status`
    pub fn listing_status(mut self, status: StatusCode) -> Self {
        self.state.listing_status = Some(status);
        self
    }

    /// Answer listing requests with an arbitrary body
    pub fn raw_listing(mut self, body: &str) -> Self {
        self.state.raw_listing = Some(body.to_string());
        self
    }

    pub async fn spawn(self) -> TestFileServer {
        let state = Arc::new(self.state);
        let app = Router::new()
            .route("/api/list", get(list_handler))
            .route("/dicom/*path", get(file_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test file server");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        TestFileServer { addr, state }
    }
}

impl TestFileServer {
    /// Acquirer pointed at this server
    pub fn acquirer(&self) -> RemoteAcquirer {
        RemoteAcquirer::new(
            format!("http://{}/api/list?path=", self.addr),
            format!("http://{}/dicom/", self.addr),
        )
    }

    pub fn listing_requests(&self) -> usize {
        self.state.listing_requests.load(Ordering::SeqCst)
    }

    pub fn file_requests(&self) -> usize {
        self.state.file_requests.load(Ordering::SeqCst)
    }
}

async fn list_handler(
    State(state): State<Arc<FileServerState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.listing_requests.fetch_add(1, Ordering::SeqCst);

    if let Some(status) = state.listing_status {
        return (status, "listing unavailable").into_response();
    }
    if let Some(raw) = &state.raw_listing {
        return ([(header::CONTENT_TYPE, "application/json")], raw.clone()).into_response();
    }

    let path = query.get("path").cloned().unwrap_or_default();
    match state.listings.get(&path) {
        Some(names) => Json(names.clone()).into_response(),
        None => Json(Vec::<String>::new()).into_response(),
    }
}

async fn file_handler(
    State(state): State<Arc<FileServerState>>,
    Path(path): Path<String>,
) -> Response {
    state.file_requests.fetch_add(1, Ordering::SeqCst);

    match state.files.get(path.trim_start_matches('/')) {
        Some(data) => (
            [(header::CONTENT_TYPE, "application/dicom")],
            data.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize test logging for detailed output
pub fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dicomlocal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
