//! Slide-microscopy classification of registered studies

use tracing::{debug, warn};

use crate::study::{MetadataStore, Modality, Study};

use super::types::ClassificationError;

/// Decide whether a study holds slide-microscopy imaging
///
/// Series are checked in order: a series matches when its own modality is
/// SM, or failing that when its *first* instance is SM. Later instances are
/// never inspected. A series without instances that does not already match
/// at series level is a structural error for the whole study.
pub fn is_microscopy_study(study: &Study) -> Result<bool, ClassificationError> {
    for series in study.series.values() {
        if series.modality == Some(Modality::SlideMicroscopy) {
            return Ok(true);
        }
        let first = series
            .first_instance()
            .ok_or_else(|| ClassificationError::MissingInstances {
                study: study.study_instance_uid.clone(),
                series: series.series_instance_uid.clone(),
            })?;
        if first.modality == Some(Modality::SlideMicroscopy) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Select the microscopy studies among `study_ids`, preserving their order
///
/// Studies that cannot be resolved or are malformed are treated as not
/// microscopy.
pub fn classify_microscopy(store: &MetadataStore, study_ids: &[String]) -> Vec<String> {
    study_ids
        .iter()
        .filter(|id| {
            let verdict = store
                .get_study(id)
                .ok_or_else(|| ClassificationError::StudyNotFound(id.to_string()))
                .and_then(|study| is_microscopy_study(&study));

            match verdict {
                Ok(is_sm) => {
                    debug!("Study {} microscopy={}", id, is_sm);
                    is_sm
                }
                Err(e) => {
                    warn!("Treating study {} as non-microscopy: {}", id, e);
                    false
                }
            }
        })
        .cloned()
        .collect()
}
