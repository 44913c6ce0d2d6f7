//! Blob record and acquisition error definitions

use bytes::Bytes;
use thiserror::Error;

/// MIME type used when a source does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors that fail a whole acquisition
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Remote acquisition is not configured (URL_API / URL_DICOM unset)")]
    RemoteDisabled,

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid file listing from {url}: {source}")]
    InvalidListing {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read uploaded files: {0}")]
    Upload(String),
}

/// A named byte sequence handed to a study builder
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Blob {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where an invocation gets its blobs from
#[derive(Debug, Clone)]
pub enum BlobSource {
    /// Files handed over directly (upload / drop)
    Direct(Vec<Blob>),
    /// Files listed and fetched under a relative path on the remote host
    Remote { relative_path: String },
}

impl BlobSource {
    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BlobSource::Direct(_) => "direct",
            BlobSource::Remote { .. } => "remote",
        }
    }
}
