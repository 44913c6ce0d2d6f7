//! Study builder backed by the `dicom` crate

use std::time::Instant;

use async_trait::async_trait;
use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::DefaultDicomObject;
use indexmap::IndexSet;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::acquire::Blob;

use super::builder::StudyBuilder;
use super::store::MetadataStore;
use super::types::{BuildError, InstanceRecord, Modality};

/// Length of the Part 10 preamble preceding the `DICM` magic code
const PREAMBLE_LEN: usize = 128;
const MAGIC_CODE: &[u8; 4] = b"DICM";

/// Parses Part 10 DICOM files and registers one instance per file
#[derive(Debug, Default, Clone)]
pub struct DicomStudyBuilder;

impl DicomStudyBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StudyBuilder for DicomStudyBuilder {
    async fn build(
        &self,
        blobs: Vec<Blob>,
        store: &MetadataStore,
    ) -> Result<Vec<String>, BuildError> {
        let start = Instant::now();
        let total = blobs.len();

        // Parsing is CPU-bound; keep it off the async workers
        let parsed = tokio::task::spawn_blocking(move || {
            blobs.iter().map(parse_blob).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| BuildError::Structural(format!("parse task failed: {}", e)))?;

        let mut study_ids = IndexSet::new();
        let mut skipped = 0usize;

        for result in parsed {
            match result {
                Ok(record) => {
                    let study_uid = record.study_instance_uid.clone();
                    if store.add_instance(record) {
                        counter!("dicomlocal_instances_registered_total").increment(1);
                    }
                    study_ids.insert(study_uid);
                }
                Err(reason) => {
                    warn!("Skipping file: {}", reason);
                    counter!("dicomlocal_files_skipped_total").increment(1);
                    skipped += 1;
                }
            }
        }

        histogram!("dicomlocal_build_duration_seconds").record(start.elapsed());
        info!(
            "Built {} studies from {} files ({} skipped)",
            study_ids.len(),
            total,
            skipped
        );

        Ok(study_ids.into_iter().collect())
    }
}

/// Parse one blob into an instance record, or a reason for skipping it
fn parse_blob(blob: &Blob) -> Result<InstanceRecord, String> {
    let object = dicom::object::from_reader(skip_preamble(&blob.data))
        .map_err(|e| format!("{}: not a readable DICOM file ({})", blob.name, e))?;

    let study_instance_uid = required_text(&object, tags::STUDY_INSTANCE_UID)
        .ok_or_else(|| format!("{}: missing StudyInstanceUID", blob.name))?;
    let series_instance_uid = required_text(&object, tags::SERIES_INSTANCE_UID)
        .ok_or_else(|| format!("{}: missing SeriesInstanceUID", blob.name))?;
    let sop_instance_uid = required_text(&object, tags::SOP_INSTANCE_UID)
        .ok_or_else(|| format!("{}: missing SOPInstanceUID", blob.name))?;
    let modality =
        required_text(&object, tags::MODALITY).and_then(|m| Modality::parse_optional(&m));

    debug!(
        "Parsed {}: study={} series={} modality={:?}",
        blob.name, study_instance_uid, series_instance_uid, modality
    );

    Ok(InstanceRecord {
        study_instance_uid,
        series_instance_uid,
        sop_instance_uid,
        modality,
        source_name: blob.name.clone(),
    })
}

/// Position the reader at the magic code, with or without a preamble
fn skip_preamble(data: &[u8]) -> &[u8] {
    if data.len() >= PREAMBLE_LEN + MAGIC_CODE.len()
        && &data[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC_CODE.len()] == MAGIC_CODE
    {
        &data[PREAMBLE_LEN..]
    } else {
        data
    }
}

fn required_text(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
    object
        .element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim_end_matches('\0').trim().to_string())
        .filter(|value| !value.is_empty())
}
