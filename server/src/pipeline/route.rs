//! Navigation target composition

use serde::{Deserialize, Serialize};

/// Query parameter carrying one study identifier
pub const STUDY_UIDS_PARAM: &str = "StudyInstanceUIDs";
/// Query parameter naming the ingestion backend
pub const DATASOURCES_PARAM: &str = "datasources";
/// Data source tag for locally ingested studies
pub const LOCAL_DATA_SOURCE: &str = "dicomlocal";

/// View paths and the microscopy capability flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// View used for ordinary studies
    pub default_mode_path: String,
    /// View used when any microscopy study is present
    pub microscopy_mode_path: String,
    /// Whether a microscopy-capable view is registered
    pub microscopy_available: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_mode_path: "viewer".to_string(),
            microscopy_mode_path: "microscopy".to_string(),
            microscopy_available: false,
        }
    }
}

/// Terminal output of a pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDirective {
    pub target_path: String,
    /// One entry per `StudyInstanceUIDs` parameter, in insertion order
    pub study_ids: Vec<String>,
    pub data_source: String,
}

impl RouteDirective {
    /// Query parameters in dispatch order
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.study_ids
            .iter()
            .map(|id| (STUDY_UIDS_PARAM, id.as_str()))
            .chain(std::iter::once((DATASOURCES_PARAM, self.data_source.as_str())))
            .collect()
    }

    /// `/<target>?StudyInstanceUIDs=..&datasources=..`, values left unescaped
    pub fn location(&self) -> String {
        let query = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("/{}?{}", self.target_path.trim_start_matches('/'), query)
    }
}

/// Build the navigation target for a batch of studies
///
/// `microscopy` is `None` when classification did not run. A non-empty
/// microscopy subset switches the target to the microscopy view and is listed
/// ahead of the full study list, so those studies appear twice.
pub fn compose_route(
    config: &RoutingConfig,
    study_ids: &[String],
    microscopy: Option<&[String]>,
) -> RouteDirective {
    let mut target_path = config.default_mode_path.clone();
    let mut params = Vec::with_capacity(study_ids.len());

    if let Some(sm) = microscopy
        && !sm.is_empty()
    {
        params.extend(sm.iter().cloned());
        target_path = config.microscopy_mode_path.clone();
    }

    params.extend(study_ids.iter().cloned());

    RouteDirective {
        target_path,
        study_ids: params,
        data_source: LOCAL_DATA_SOURCE.to_string(),
    }
}
