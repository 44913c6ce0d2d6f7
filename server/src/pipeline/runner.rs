//! Acquire -> build -> classify -> route

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{error, info};

use crate::acquire::{AcquisitionError, Blob, BlobSource, RemoteAcquirer};
use crate::study::{MetadataStore, StudyBuilder};

use super::classify::classify_microscopy;
use super::route::{RouteDirective, RoutingConfig, compose_route};
use super::types::{Invocation, PipelineError, PipelineStage};

/// The ingestion pipeline
///
/// Holds no per-invocation state: concurrent calls to [`IngestPipeline::run`]
/// are independent and share only the metadata store.
pub struct IngestPipeline {
    builder: Arc<dyn StudyBuilder>,
    store: Arc<MetadataStore>,
    remote: Option<RemoteAcquirer>,
    routing: RoutingConfig,
}

impl IngestPipeline {
    pub fn new(
        builder: Arc<dyn StudyBuilder>,
        store: Arc<MetadataStore>,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            builder,
            store,
            remote: None,
            routing,
        }
    }

    /// Enable remote acquisition
    pub fn with_remote(mut self, remote: RemoteAcquirer) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Run one invocation to completion
    pub async fn run(&self, source: BlobSource) -> Result<RouteDirective, PipelineError> {
        self.run_traced(source).await.1
    }

    /// Run one invocation, also returning the stages it went through
    pub async fn run_traced(
        &self,
        source: BlobSource,
    ) -> (Invocation, Result<RouteDirective, PipelineError>) {
        let mut invocation = Invocation::new();
        let kind = source.kind();
        let start = Instant::now();

        counter!("dicomlocal_pipeline_runs_total", "source" => kind).increment(1);
        info!("Invocation {} started ({} source)", invocation.id, kind);

        let result = self.execute(&mut invocation, source).await;

        match &result {
            Ok(route) => {
                invocation.advance(PipelineStage::Routed);
                info!(
                    "Invocation {} routed to {} with {} study parameters",
                    invocation.id,
                    route.target_path,
                    route.study_ids.len()
                );
            }
            Err(e) => {
                let failed_at = invocation.stage();
                counter!("dicomlocal_pipeline_failures_total", "stage" => failed_at.to_string())
                    .increment(1);
                error!(
                    "Invocation {} failed while {}: {}",
                    invocation.id, failed_at, e
                );
                invocation.advance(PipelineStage::Failed);
            }
        }

        histogram!("dicomlocal_pipeline_duration_seconds").record(start.elapsed());
        (invocation, result)
    }

    async fn execute(
        &self,
        invocation: &mut Invocation,
        source: BlobSource,
    ) -> Result<RouteDirective, PipelineError> {
        invocation.advance(PipelineStage::Acquiring);
        let blobs = self.acquire(source).await?;

        invocation.advance(PipelineStage::Building);
        let study_ids = self.builder.build(blobs, &self.store).await?;

        invocation.advance(PipelineStage::Classifying);
        let microscopy = if self.routing.microscopy_available {
            Some(classify_microscopy(&self.store, &study_ids))
        } else {
            None
        };

        Ok(compose_route(&self.routing, &study_ids, microscopy.as_deref()))
    }

    async fn acquire(&self, source: BlobSource) -> Result<Vec<Blob>, AcquisitionError> {
        match source {
            BlobSource::Direct(blobs) => Ok(blobs),
            BlobSource::Remote { relative_path } => {
                let remote = self.remote.as_ref().ok_or(AcquisitionError::RemoteDisabled)?;
                remote.acquire(&relative_path).await
            }
        }
    }
}
