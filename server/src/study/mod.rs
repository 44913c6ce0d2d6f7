//! DICOM study model and registration
//!
//! This module provides:
//! - `Study` / `Series` / `Instance` records and the `Modality` code
//! - `MetadataStore`, the shared registry studies are built into
//! - `StudyBuilder` trait for abstracting the parser
//! - `DicomStudyBuilder`, parsing Part 10 files with the `dicom` crate

mod builder;
mod parser;
mod store;
mod types;

pub use builder::StudyBuilder;
pub use parser::DicomStudyBuilder;
pub use store::MetadataStore;
pub use types::{BuildError, Instance, InstanceRecord, Modality, Series, Study};
