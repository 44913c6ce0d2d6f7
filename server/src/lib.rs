//! dicomlocal Server Library
//!
//! This module exports the ingestion components for use in integration tests
//! and external tooling.

pub mod acquire;
pub mod config;
pub mod pipeline;
pub mod study;


// Re-export commonly used types
pub use acquire::{Blob, BlobSource, RemoteAcquirer};
pub use pipeline::{IngestPipeline, LocalAppState, RouteDirective, RoutingConfig, local_routes};
pub use study::{DicomStudyBuilder, MetadataStore, StudyBuilder};
