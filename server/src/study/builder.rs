//! StudyBuilder trait definition

use async_trait::async_trait;

use crate::acquire::Blob;

use super::store::MetadataStore;
use super::types::BuildError;

/// Turns a batch of blobs into registered studies
///
/// Implementations parse every blob, register the resulting instances into
/// `store` and return the StudyInstanceUIDs of the batch. Every returned
/// identifier must be resolvable in `store` when the call returns.
/// Unparsable blobs are skipped; a batch with nothing parsable yields an
/// empty list rather than an error.
#[async_trait]
pub trait StudyBuilder: Send + Sync {
    async fn build(&self, blobs: Vec<Blob>, store: &MetadataStore)
    -> Result<Vec<String>, BuildError>;
}
