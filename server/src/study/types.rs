//! Study hierarchy records and error definitions

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a study builder for a whole batch
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Structural build failure: {0}")]
    Structural(String),
}

/// DICOM modality code (0008,0060)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Modality {
    /// Slide microscopy
    SlideMicroscopy,
    Ct,
    Mr,
    Us,
    Cr,
    Dx,
    Mg,
    Pt,
    Nm,
    Xa,
    Seg,
    Sr,
    Ot,
    /// Any code not listed above, kept verbatim
    Other(String),
}

impl Modality {
    /// The DICOM code string for this modality
    pub fn code(&self) -> &str {
        match self {
            Modality::SlideMicroscopy => "SM",
            Modality::Ct => "CT",
            Modality::Mr => "MR",
            Modality::Us => "US",
            Modality::Cr => "CR",
            Modality::Dx => "DX",
            Modality::Mg => "MG",
            Modality::Pt => "PT",
            Modality::Nm => "NM",
            Modality::Xa => "XA",
            Modality::Seg => "SEG",
            Modality::Sr => "SR",
            Modality::Ot => "OT",
            Modality::Other(code) => code,
        }
    }

    /// Parse an attribute value, treating blank values as absent
    pub fn parse_optional(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl FromStr for Modality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim_end_matches('\0').trim();
        if code.is_empty() {
            return Err(());
        }
        Ok(match code {
            "SM" => Modality::SlideMicroscopy,
            "CT" => Modality::Ct,
            "MR" => Modality::Mr,
            "US" => Modality::Us,
            "CR" => Modality::Cr,
            "DX" => Modality::Dx,
            "MG" => Modality::Mg,
            "PT" => Modality::Pt,
            "NM" => Modality::Nm,
            "XA" => Modality::Xa,
            "SEG" => Modality::Seg,
            "SR" => Modality::Sr,
            "OT" => Modality::Ot,
            other => Modality::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<Modality> for String {
    fn from(m: Modality) -> Self {
        m.code().to_string()
    }
}

impl From<String> for Modality {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Modality::Other(s))
    }
}

/// A single image (SOP instance) registered in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub sop_instance_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
    /// Name of the blob this instance was parsed from
    pub source_name: String,
}

/// An imaging run within a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub series_instance_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
    /// Instances in registration order
    pub instances: Vec<Instance>,
}

impl Series {
    pub fn new(series_instance_uid: impl Into<String>) -> Self {
        Self {
            series_instance_uid: series_instance_uid.into(),
            modality: None,
            instances: Vec::new(),
        }
    }

    /// First registered instance, if any
    pub fn first_instance(&self) -> Option<&Instance> {
        self.instances.first()
    }
}

/// A DICOM study as held by the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub study_instance_uid: String,
    /// Series keyed by SeriesInstanceUID, in registration order
    pub series: IndexMap<String, Series>,
}

impl Study {
    pub fn new(study_instance_uid: impl Into<String>) -> Self {
        Self {
            study_instance_uid: study_instance_uid.into(),
            series: IndexMap::new(),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.series.values().map(|s| s.instances.len()).sum()
    }
}

/// Flat record produced by parsing one blob, ready for registration
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
    pub modality: Option<Modality>,
    pub source_name: String,
}
