//! File acquisition
//!
//! This module provides:
//! - `Blob`, the named byte sequence every acquisition path produces
//! - `BlobSource`, selecting direct (uploaded) or remote acquisition
//! - `RemoteAcquirer` for listing and fetching files over HTTP

mod remote;
mod types;

pub use remote::RemoteAcquirer;
pub use types::{AcquisitionError, Blob, BlobSource, DEFAULT_CONTENT_TYPE};
