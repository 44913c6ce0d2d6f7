//! Pipeline stages and error definitions

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::acquire::AcquisitionError;
use crate::study::BuildError;

/// Errors that end an invocation in the `Failed` stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Study build failed: {0}")]
    Build(#[from] BuildError),
}

/// Structural problems found while classifying a study
///
/// Never propagated: the study is treated as non-microscopy.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Study not found in metadata store: {0}")]
    StudyNotFound(String),

    #[error("Series {series} of study {study} has no instances")]
    MissingInstances { study: String, series: String },
}

/// Lifecycle of a single pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Acquiring,
    Building,
    Classifying,
    Routed,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Routed | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Acquiring => "acquiring",
            PipelineStage::Building => "building",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Routed => "routed",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Record of one invocation's progress through the stages
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub id: Uuid,
    stages: Vec<PipelineStage>,
}

impl Invocation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stages: vec![PipelineStage::Idle],
        }
    }

    /// Current stage
    pub fn stage(&self) -> PipelineStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(PipelineStage::Idle)
    }

    /// Every stage entered so far, starting with `Idle`
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Move to `next`; ignored once a terminal stage is reached
    pub(crate) fn advance(&mut self, next: PipelineStage) {
        let current = self.stage();
        if current.is_terminal() {
            return;
        }
        tracing::debug!("Invocation {}: {} -> {}", self.id, current, next);
        self.stages.push(next);
    }
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new()
    }
}
