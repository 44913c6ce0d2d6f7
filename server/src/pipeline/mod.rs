//! Ingestion pipeline
//!
//! This module provides:
//! - `IngestPipeline`, running acquire -> build -> classify -> route
//! - `classify_microscopy` for slide-microscopy detection
//! - `compose_route` and `RouteDirective` for the navigation target
//! - HTTP routes that trigger invocations and dispatch their result

mod classify;
mod route;
pub mod routes;
mod runner;
mod types;

pub use classify::{classify_microscopy, is_microscopy_study};
pub use route::{
    DATASOURCES_PARAM, LOCAL_DATA_SOURCE, RouteDirective, RoutingConfig, STUDY_UIDS_PARAM,
    compose_route,
};
pub use routes::{LocalAppState, RouteResponse, local_routes};
pub use runner::IngestPipeline;
pub use types::{ClassificationError, Invocation, PipelineError, PipelineStage};
