//! Importer for detection datasets stored on disk
//!
//! Same index layout as classification, but each target in `labels.json` is
//! a list of `{label, bounding_box: [x, y, w, h], confidence?}` records with
//! relative coordinates in `[0, 1] x [0, 1]`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sampleset_core::{Detection, Detections};

use crate::error::{Error, Result};
use crate::importer::{maybe_metadata, ImportItem, ImportSource, ImporterState};
use crate::index::{data_paths_by_stem, load_labels_index, ClassTarget};

/// One detection record as stored in `labels.json`
#[derive(Debug, Clone, Deserialize)]
struct DetectionRecord {
    label: ClassTarget,
    bounding_box: [f64; 4],
    #[serde(default)]
    confidence: Option<f64>,
}

impl DetectionRecord {
    fn resolve(&self, classes: Option<&[String]>) -> Result<Detection> {
        Ok(Detection {
            label: self.label.resolve(classes)?,
            bounding_box: self.bounding_box,
            confidence: self.confidence,
        })
    }
}

/// Importer for image detection datasets in the index layout
pub struct ImageDetectionImporter {
    dataset_dir: PathBuf,
    compute_metadata: bool,
    state: ImporterState,
    classes: Option<Vec<String>>,
    entries: Vec<(String, Vec<DetectionRecord>)>,
    image_paths: HashMap<String, PathBuf>,
    pos: usize,
}

impl ImageDetectionImporter {
    /// Create an importer over the given dataset directory
    pub fn new<P: AsRef<Path>>(dataset_dir: P, compute_metadata: bool) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_path_buf(),
            compute_metadata,
            state: ImporterState::Unopened,
            classes: None,
            entries: Vec::new(),
            image_paths: HashMap::new(),
            pos: 0,
        }
    }

    /// Whether this importer computes media metadata per item
    pub fn computes_metadata(&self) -> bool {
        self.compute_metadata
    }
}

impl ImportSource for ImageDetectionImporter {
    fn state(&self) -> ImporterState {
        self.state
    }

    fn setup(&mut self) -> Result<()> {
        if self.state != ImporterState::Unopened {
            return Err(Error::Lifecycle(
                "setup may only run on an unopened importer".to_string(),
            ));
        }

        self.image_paths = data_paths_by_stem(&self.dataset_dir)?;

        let index = load_labels_index::<Vec<DetectionRecord>>(&self.dataset_dir)?;
        self.classes = index.classes;
        self.entries = index.labels.into_iter().collect();
        self.state = ImporterState::Open;
        Ok(())
    }

    fn next_item(&mut self) -> Result<Option<ImportItem>> {
        if self.state != ImporterState::Open {
            return Err(Error::Lifecycle(
                "the importer is not open for iteration".to_string(),
            ));
        }

        let Some((uuid, records)) = self.entries.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;

        let path = self
            .image_paths
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::Format(format!("no image found under data/ for '{uuid}'")))?;

        let detections = records
            .iter()
            .map(|record| record.resolve(self.classes.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        let metadata = maybe_metadata(self.compute_metadata, &path)?;

        Ok(Some(ImportItem {
            path,
            metadata,
            label: Some(Detections { detections }.into()),
        }))
    }

    fn len(&self) -> Result<usize> {
        if self.state == ImporterState::Unopened {
            return Err(Error::LengthUnknown("ImageDetectionImporter"));
        }
        Ok(self.entries.len())
    }

    fn close(&mut self) {
        self.entries.clear();
        self.image_paths.clear();
        self.state = ImporterState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampleset_core::Label;
    use std::fs;

    #[test]
    fn test_detection_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.jpg"), b"x").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{
                "classes": ["cat", "dog"],
                "labels": {
                    "a": [
                        {"label": 0, "bounding_box": [0.1, 0.2, 0.3, 0.4], "confidence": 0.9},
                        {"label": "dog", "bounding_box": [0.5, 0.5, 0.2, 0.2]}
                    ]
                }
            }"#,
        )
        .unwrap();

        // "dog" is not a valid class id when a class list is present
        let mut importer = ImageDetectionImporter::new(dir.path(), false);
        importer.setup().unwrap();
        assert!(matches!(importer.next_item(), Err(Error::Format(_))));
    }

    #[test]
    fn test_detection_index_resolves_labels() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.jpg"), b"x").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{
                "classes": ["cat", "dog"],
                "labels": {
                    "a": [
                        {"label": 0, "bounding_box": [0.1, 0.2, 0.3, 0.4], "confidence": 0.9},
                        {"label": "1", "bounding_box": [0.5, 0.5, 0.2, 0.2]}
                    ]
                }
            }"#,
        )
        .unwrap();

        let mut importer = ImageDetectionImporter::new(dir.path(), false);
        importer.setup().unwrap();
        assert_eq!(importer.len().unwrap(), 1);

        let item = importer.next_item().unwrap().unwrap();
        let Label::Detections(detections) = item.label.unwrap() else {
            panic!("expected a detections label");
        };
        assert_eq!(detections.detections.len(), 2);
        assert_eq!(detections.detections[0].label, "cat");
        assert_eq!(detections.detections[0].bounding_box, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(detections.detections[0].confidence, Some(0.9));
        assert_eq!(detections.detections[1].label, "dog");
        assert_eq!(detections.detections[1].confidence, None);

        assert!(importer.next_item().unwrap().is_none());
    }

    #[test]
    fn test_raw_string_labels_without_class_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.jpg"), b"x").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{"labels": {"a": [{"label": "cat", "bounding_box": [0, 0, 1, 1]}]}}"#,
        )
        .unwrap();

        let mut importer = ImageDetectionImporter::new(dir.path(), false);
        importer.setup().unwrap();

        let item = importer.next_item().unwrap().unwrap();
        let Label::Detections(detections) = item.label.unwrap() else {
            panic!("expected a detections label");
        };
        assert_eq!(detections.detections[0].label, "cat");
    }
}
