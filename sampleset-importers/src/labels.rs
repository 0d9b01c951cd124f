//! Generic adapter over an external labeled-dataset reader
//!
//! Formats with their own on-disk conventions are consumed through the
//! [`LabeledDatasetReader`] trait; the adapter pairs the reader's data paths
//! with its labels and yields them as opaque image-labels payloads.

use std::path::PathBuf;

use sampleset_core::ImageLabels;

use crate::error::{Error, Result};
use crate::importer::{maybe_metadata, ImportItem, ImportSource, ImporterState};

/// An external labeled-dataset reader
///
/// Data paths and labels iterate in the same order, and the total length is
/// known up front.
pub trait LabeledDatasetReader: Send {
    /// The number of samples in the dataset
    fn len(&self) -> usize;

    /// Whether the dataset has no samples
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the media paths, in dataset order
    fn iter_data_paths(&self) -> Box<dyn Iterator<Item = PathBuf> + '_>;

    /// Iterate over the raw labels payloads, paired with the data paths
    fn iter_labels(&self) -> Box<dyn Iterator<Item = serde_json::Value> + '_>;
}

/// Importer that delegates discovery to a [`LabeledDatasetReader`]
pub struct LabeledImageAdapter {
    reader: Box<dyn LabeledDatasetReader>,
    compute_metadata: bool,
    state: ImporterState,
    entries: Vec<(PathBuf, serde_json::Value)>,
    pos: usize,
}

impl LabeledImageAdapter {
    /// Create an adapter over the given reader
    pub fn new(reader: Box<dyn LabeledDatasetReader>, compute_metadata: bool) -> Self {
        Self {
            reader,
            compute_metadata,
            state: ImporterState::Unopened,
            entries: Vec::new(),
            pos: 0,
        }
    }

    /// Whether this importer computes media metadata per item
    pub fn computes_metadata(&self) -> bool {
        self.compute_metadata
    }
}

impl ImportSource for LabeledImageAdapter {
    fn state(&self) -> ImporterState {
        self.state
    }

    fn setup(&mut self) -> Result<()> {
        if self.state != ImporterState::Unopened {
            return Err(Error::Lifecycle(
                "setup may only run on an unopened importer".to_string(),
            ));
        }

        self.entries = self
            .reader
            .iter_data_paths()
            .zip(self.reader.iter_labels())
            .collect();
        self.state = ImporterState::Open;
        Ok(())
    }

    fn next_item(&mut self) -> Result<Option<ImportItem>> {
        if self.state != ImporterState::Open {
            return Err(Error::Lifecycle(
                "the importer is not open for iteration".to_string(),
            ));
        }

        let Some((path, labels)) = self.entries.get(self.pos).cloned() else {
            return Ok(None);
        };
        self.pos += 1;

        let metadata = maybe_metadata(self.compute_metadata, &path)?;
        Ok(Some(ImportItem {
            path,
            metadata,
            label: Some(ImageLabels { labels }.into()),
        }))
    }

    fn len(&self) -> Result<usize> {
        // The reader knows its length up front
        Ok(self.reader.len())
    }

    fn close(&mut self) {
        self.entries.clear();
        self.state = ImporterState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampleset_core::Label;
    use serde_json::json;

    struct FakeReader {
        paths: Vec<PathBuf>,
        labels: Vec<serde_json::Value>,
    }

    impl LabeledDatasetReader for FakeReader {
        fn len(&self) -> usize {
            self.paths.len()
        }

        fn iter_data_paths(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
            Box::new(self.paths.iter().cloned())
        }

        fn iter_labels(&self) -> Box<dyn Iterator<Item = serde_json::Value> + '_> {
            Box::new(self.labels.iter().cloned())
        }
    }

    fn reader() -> Box<FakeReader> {
        Box::new(FakeReader {
            paths: vec![PathBuf::from("/data/a.jpg"), PathBuf::from("/data/b.jpg")],
            labels: vec![json!({"attrs": ["outdoor"]}), json!({"attrs": ["indoor"]})],
        })
    }

    #[test]
    fn test_pairs_paths_with_labels() {
        let mut adapter = LabeledImageAdapter::new(reader(), false);
        adapter.setup().unwrap();

        let first = adapter.next_item().unwrap().unwrap();
        assert_eq!(first.path, PathBuf::from("/data/a.jpg"));
        let Some(Label::ImageLabels(labels)) = first.label else {
            panic!("expected an image-labels payload");
        };
        assert_eq!(labels.labels, json!({"attrs": ["outdoor"]}));

        let second = adapter.next_item().unwrap().unwrap();
        assert_eq!(second.path, PathBuf::from("/data/b.jpg"));
        assert!(adapter.next_item().unwrap().is_none());
    }

    #[test]
    fn test_len_known_before_setup() {
        let adapter = LabeledImageAdapter::new(reader(), false);
        assert_eq!(adapter.len().unwrap(), 2);
    }
}
