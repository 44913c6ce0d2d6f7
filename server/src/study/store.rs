//! Process-wide DICOM metadata store
//!
//! Studies are registered by builders and read back by identifier. The store
//! is append-only: series and instances are never removed or reordered once
//! registered.

use dashmap::DashMap;
use tracing::debug;

use super::types::{Instance, InstanceRecord, Series, Study};

/// Concurrent map of StudyInstanceUID -> Study
///
/// Writers lock only the shard holding the study they touch, so concurrent
/// ingestion batches for different studies do not contend.
#[derive(Debug, Default)]
pub struct MetadataStore {
    studies: DashMap<String, Study>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one parsed instance
    ///
    /// Returns `false` if an instance with the same SOPInstanceUID was already
    /// registered in that series.
    pub fn add_instance(&self, record: InstanceRecord) -> bool {
        let mut study = self
            .studies
            .entry(record.study_instance_uid.clone())
            .or_insert_with(|| Study::new(record.study_instance_uid.clone()));

        let series = study
            .series
            .entry(record.series_instance_uid.clone())
            .or_insert_with(|| Series::new(record.series_instance_uid.clone()));

        if series
            .instances
            .iter()
            .any(|i| i.sop_instance_uid == record.sop_instance_uid)
        {
            debug!(
                "Instance {} already registered in series {}",
                record.sop_instance_uid, record.series_instance_uid
            );
            return false;
        }

        if series.modality.is_none() {
            series.modality = record.modality.clone();
        }

        series.instances.push(Instance {
            sop_instance_uid: record.sop_instance_uid,
            modality: record.modality,
            source_name: record.source_name,
        });
        true
    }

    /// Snapshot of a registered study
    pub fn get_study(&self, study_instance_uid: &str) -> Option<Study> {
        self.studies
            .get(study_instance_uid)
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, study_instance_uid: &str) -> bool {
        self.studies.contains_key(study_instance_uid)
    }

    /// Number of registered studies
    pub fn len(&self) -> usize {
        self.studies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }
}
