//! Importers for loading on-disk datasets into sample collections
//!
//! Each importer understands one storage layout and yields its contents as
//! per-sample items through the [`ImportSource`] protocol; [`import_samples`]
//! drives any importer to completion and persists the result into a dataset.

#![warn(missing_docs)]

pub mod classification;
pub mod detection;
pub mod directory;
pub mod error;
pub mod import;
pub mod importer;
mod index;
pub mod labels;

pub use classification::{
    parse_classification_tree, ClassificationTreeImporter, ImageClassificationImporter,
};
pub use detection::ImageDetectionImporter;
pub use directory::ImageDirectoryImporter;
pub use error::{Error, Result};
pub use import::import_samples;
pub use importer::{
    Capability, ImportItem, ImportSource, Importer, ImporterGuard, ImporterState,
};
pub use labels::{LabeledDatasetReader, LabeledImageAdapter};
