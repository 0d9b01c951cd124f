//! In-memory sample records
//!
//! A [`Sample`] is created unbound, becomes bound to a dataset when it is
//! added (receiving its store-assigned id), and is unbound again when it is
//! deleted. A sample is owned by at most one dataset at a time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::label::Label;
use crate::metadata::ImageMetadata;
use crate::store::SampleDocument;

/// A store-assigned record identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleId(Uuid);

impl SampleId {
    /// Generate a fresh id
    ///
    /// Only stores assign ids; this is not part of the public sample
    /// lifecycle.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Binding {
    dataset: String,
    id: SampleId,
}

/// One record: a raw-media reference plus metadata, tags, and label fields
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    filepath: PathBuf,
    metadata: Option<ImageMetadata>,
    tags: Vec<String>,
    labels: BTreeMap<String, Label>,
    binding: Option<Binding>,
}

impl Sample {
    /// Create a new unbound sample for the given media path
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            metadata: None,
            tags: Vec::new(),
            labels: BTreeMap::new(),
            binding: None,
        }
    }

    /// Attach media metadata
    pub fn with_metadata(mut self, metadata: Option<ImageMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach tags
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Attach a label under the given field name
    pub fn with_label(mut self, field: impl Into<String>, label: impl Into<Label>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    /// The media path of this sample
    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// The media metadata, if any
    pub fn metadata(&self) -> Option<&ImageMetadata> {
        self.metadata.as_ref()
    }

    /// The tags on this sample
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// All label fields on this sample
    pub fn labels(&self) -> &BTreeMap<String, Label> {
        &self.labels
    }

    /// The label at the given field, if present
    pub fn label(&self, field: &str) -> Option<&Label> {
        self.labels.get(field)
    }

    /// The store-assigned id, absent while unbound
    pub fn id(&self) -> Option<SampleId> {
        self.binding.as_ref().map(|b| b.id)
    }

    /// The name of the owning dataset, absent while unbound
    pub fn dataset(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.dataset.as_str())
    }

    /// Whether this sample is bound to a dataset
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Produce an independent unbound copy of this sample
    pub fn copy(&self) -> Self {
        Self {
            filepath: self.filepath.clone(),
            metadata: self.metadata.clone(),
            tags: self.tags.clone(),
            labels: self.labels.clone(),
            binding: None,
        }
    }

    pub(crate) fn bind(&mut self, dataset: &str, id: SampleId) {
        self.binding = Some(Binding {
            dataset: dataset.to_string(),
            id,
        });
    }

    pub(crate) fn unbind(&mut self) {
        self.binding = None;
    }

    /// Convert to an unpersisted store document
    pub(crate) fn to_document(&self) -> SampleDocument {
        SampleDocument {
            id: None,
            filepath: self.filepath.clone(),
            metadata: self.metadata.clone(),
            tags: self.tags.clone(),
            labels: self.labels.clone(),
        }
    }

    /// Reconstruct a bound sample from a persisted store document
    pub(crate) fn from_document(doc: SampleDocument, dataset: &str) -> Self {
        let binding = doc.id.map(|id| Binding {
            dataset: dataset.to_string(),
            id,
        });
        Self {
            filepath: doc.filepath,
            metadata: doc.metadata,
            tags: doc.tags,
            labels: doc.labels,
            binding,
        }
    }
}
