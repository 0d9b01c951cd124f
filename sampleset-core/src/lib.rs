//! Core dataset model: identity, schema, samples, and the record store
//! adapter
//!
//! This crate manages named, homogeneous collections of media samples backed
//! by a persistent document store. It provides the dataset registry (one
//! live instance per name), the runtime-mutable schema bound to each
//! dataset, the sample ownership model, and the store traits that importers
//! and exporters build upon.

#![warn(missing_docs)]

pub mod dataset;
pub mod error;
pub mod label;
pub mod metadata;
pub mod registry;
pub mod sample;
pub mod schema;
pub mod store;

// Re-export key types for convenience
pub use dataset::{list_dataset_names, Dataset, SampleKey};
pub use error::{Error, Result};
pub use label::{Classification, Detection, Detections, ImageLabels, Label, LabelKind};
pub use metadata::{is_image_path, ImageFormat, ImageMetadata};
pub use registry::DatasetRegistry;
pub use sample::{Sample, SampleId};
pub use schema::{EmbeddedType, FieldKind, KindFilter, ScalarKind, Schema};
pub use store::{MemoryBackend, MemoryStore, RecordStore, SampleDocument, StoreBackend};
