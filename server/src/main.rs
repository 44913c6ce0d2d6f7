use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use dicomlocal_server::config::Config;
use dicomlocal_server::{
    DicomStudyBuilder, IngestPipeline, LocalAppState, MetadataStore, RemoteAcquirer,
    local_routes,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Prometheus metrics handle for exposing metrics in Prometheus format
static PROMETHEUS_HANDLE: std::sync::OnceLock<PrometheusHandle> = std::sync::OnceLock::new();

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    remote_source: &'static str,
    studies: usize,
    uptime_seconds: u64,
}

async fn health(State(state): State<LocalAppState>) -> Json<HealthResponse> {
    let uptime = START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);
    let remote_source = if state.pipeline.remote_enabled() {
        "configured"
    } else {
        "disabled"
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        remote_source,
        studies: state.pipeline.store().len(),
        uptime_seconds: uptime,
    })
}

/// Endpoint to expose metrics in Prometheus format
async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    START_TIME.set(Instant::now()).ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dicomlocal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Must be installed before any metric is recorded
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;
    PROMETHEUS_HANDLE.set(prometheus_handle).ok();

    let config = Config::from_env();
    info!(
        "Loaded configuration: host={}, port={}, default_mode={}, microscopy={}",
        config.host,
        config.port,
        config.routing.default_mode_path,
        config.routing.microscopy_available
    );

    let store = Arc::new(MetadataStore::new());
    let mut pipeline = IngestPipeline::new(
        Arc::new(DicomStudyBuilder::new()),
        store,
        config.routing.clone(),
    );

    match RemoteAcquirer::from_config(&config.remote) {
        Some(remote) => {
            info!(
                "Remote acquisition enabled: listing={:?}, content={:?}",
                config.remote.api_base, config.remote.content_base
            );
            pipeline = pipeline.with_remote(remote);
        }
        None => {
            warn!("URL_API / URL_DICOM not set - remote acquisition disabled");
        }
    }

    let state = LocalAppState {
        pipeline: Arc::new(pipeline),
        max_upload_size: config.upload.max_upload_size,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics/prometheus", get(prometheus_metrics))
        .with_state(state.clone())
        .merge(local_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("dicomlocal server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
