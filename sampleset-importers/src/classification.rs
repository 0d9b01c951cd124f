//! Importers for classification datasets stored on disk
//!
//! Two layouts are supported: an index layout (`data/` plus `labels.json`)
//! and a directory tree (`<class>/<image>`, label = parent directory name).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sampleset_core::Classification;

use crate::error::{Error, Result};
use crate::importer::{maybe_metadata, ImportItem, ImportSource, ImporterState};
use crate::index::{data_paths_by_stem, load_labels_index, ClassTarget};

/// Importer for image classification datasets in the index layout
///
/// `setup` maps the files under `data/` by stem and parses `labels.json`;
/// iteration yields one `(image_path, metadata?, Classification)` item per
/// index entry. Targets are resolved through the optional class list.
pub struct ImageClassificationImporter {
    dataset_dir: PathBuf,
    compute_metadata: bool,
    state: ImporterState,
    classes: Option<Vec<String>>,
    entries: Vec<(String, ClassTarget)>,
    image_paths: HashMap<String, PathBuf>,
    pos: usize,
}

impl ImageClassificationImporter {
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

impl ImportSource for ImageClassificationImporter {
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

        let index = load_labels_index::<ClassTarget>(&self.dataset_dir)?;
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

        let Some((uuid, target)) = self.entries.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;

        let path = self
            .image_paths
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::Format(format!("no image found under data/ for '{uuid}'")))?;

        let label = Classification::new(target.resolve(self.classes.as_deref())?);
        let metadata = maybe_metadata(self.compute_metadata, &path)?;

        Ok(Some(ImportItem {
            path,
            metadata,
            label: Some(label.into()),
        }))
    }

    fn len(&self) -> Result<usize> {
        if self.state == ImporterState::Unopened {
            return Err(Error::LengthUnknown("ImageClassificationImporter"));
        }
        Ok(self.entries.len())
    }

    fn close(&mut self) {
        self.entries.clear();
        self.image_paths.clear();
        self.state = ImporterState::Closed;
    }
}

/// Importer for a classification directory tree
///
/// `setup` expands the two-level `<class>/<image>` layout; entries whose
/// class or file name begins with `.` are excluded. The label is the
/// immediate parent directory name.
pub struct ClassificationTreeImporter {
    dataset_dir: PathBuf,
    compute_metadata: bool,
    state: ImporterState,
    entries: Vec<(PathBuf, String)>,
    pos: usize,
}

impl ClassificationTreeImporter {
    /// Create an importer over the given dataset directory
    pub fn new<P: AsRef<Path>>(dataset_dir: P, compute_metadata: bool) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_path_buf(),
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

impl ImportSource for ClassificationTreeImporter {
    fn state(&self) -> ImporterState {
        self.state
    }

    fn setup(&mut self) -> Result<()> {
        if self.state != ImporterState::Unopened {
            return Err(Error::Lifecycle(
                "setup may only run on an unopened importer".to_string(),
            ));
        }

        self.entries = expand_tree(&self.dataset_dir)?;
        self.state = ImporterState::Open;
        Ok(())
    }

    fn next_item(&mut self) -> Result<Option<ImportItem>> {
        if self.state != ImporterState::Open {
            return Err(Error::Lifecycle(
                "the importer is not open for iteration".to_string(),
            ));
        }

        let Some((path, class_name)) = self.entries.get(self.pos).cloned() else {
            return Ok(None);
        };
        self.pos += 1;

        let metadata = maybe_metadata(self.compute_metadata, &path)?;
        Ok(Some(ImportItem {
            path,
            metadata,
            label: Some(Classification::new(class_name).into()),
        }))
    }

    fn len(&self) -> Result<usize> {
        if self.state == ImporterState::Unopened {
            return Err(Error::LengthUnknown("ClassificationTreeImporter"));
        }
        Ok(self.entries.len())
    }

    fn close(&mut self) {
        self.entries.clear();
        self.state = ImporterState::Closed;
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Expand the two-level `<class>/<file>` layout, skipping hidden components
fn expand_tree(dataset_dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut entries = Vec::new();

    let mut class_dirs: Vec<PathBuf> = fs::read_dir(dataset_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    class_dirs.sort();

    for class_dir in class_dirs {
        let Some(class_name) = class_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_hidden(class_name) {
            continue;
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&class_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_hidden(file_name) {
                continue;
            }
            entries.push((path, class_name.to_string()));
        }
    }

    Ok(entries)
}

/// Parse a classification directory tree into `(image_path, class_id)` pairs
/// plus the sorted class list
pub fn parse_classification_tree(dataset_dir: &Path) -> Result<(Vec<(PathBuf, usize)>, Vec<String>)> {
    let entries = expand_tree(dataset_dir)?;

    let mut classes: Vec<String> = entries.iter().map(|(_, c)| c.clone()).collect();
    classes.sort();
    classes.dedup();

    let samples = entries
        .into_iter()
        .map(|(path, class_name)| {
            let target = classes
                .binary_search(&class_name)
                .expect("class list was built from the entries");
            (path, target)
        })
        .collect();

    Ok((samples, classes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampleset_core::Label;
    use std::fs;

    fn drain(importer: &mut dyn ImportSource) -> Vec<ImportItem> {
        importer.setup().unwrap();
        let mut items = Vec::new();
        while let Some(item) = importer.next_item().unwrap() {
            items.push(item);
        }
        items
    }

    fn classification_label(item: &ImportItem) -> String {
        match item.label.as_ref().unwrap() {
            Label::Classification(c) => c.label.clone(),
            other => panic!("expected a classification label, got {other:?}"),
        }
    }

    #[test]
    fn test_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("data/b.jpg"), b"x").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{"classes": ["cat", "dog"], "labels": {"a": "0", "b": 1}}"#,
        )
        .unwrap();

        let mut importer = ImageClassificationImporter::new(dir.path(), false);
        let items = drain(&mut importer);

        let mut pairs: Vec<(String, String)> = items
            .iter()
            .map(|item| {
                (
                    item.path.file_name().unwrap().to_str().unwrap().to_string(),
                    classification_label(item),
                )
            })
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("a.jpg".to_string(), "cat".to_string()),
                ("b.jpg".to_string(), "dog".to_string()),
            ]
        );
        assert_eq!(importer.len().unwrap(), 2);
    }

    #[test]
    fn test_index_without_class_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.jpg"), b"x").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{"labels": {"a": "cat"}}"#,
        )
        .unwrap();

        let mut importer = ImageClassificationImporter::new(dir.path(), false);
        let items = drain(&mut importer);
        assert_eq!(items.len(), 1);
        assert_eq!(classification_label(&items[0]), "cat");
    }

    #[test]
    fn test_index_entry_without_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{"labels": {"missing": "cat"}}"#,
        )
        .unwrap();

        let mut importer = ImageClassificationImporter::new(dir.path(), false);
        importer.setup().unwrap();
        assert!(matches!(importer.next_item(), Err(Error::Format(_))));
    }

    #[test]
    fn test_tree_labels_from_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("cat")).unwrap();
        fs::write(dir.path().join("cat/a.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("dog")).unwrap();
        fs::write(dir.path().join("dog/b.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/c.jpg"), b"x").unwrap();
        fs::write(dir.path().join("cat/.thumbnail.jpg"), b"x").unwrap();

        let mut importer = ClassificationTreeImporter::new(dir.path(), false);
        let items = drain(&mut importer);

        let pairs: Vec<(String, String)> = items
            .iter()
            .map(|item| {
                (
                    item.path.file_name().unwrap().to_str().unwrap().to_string(),
                    classification_label(item),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a.jpg".to_string(), "cat".to_string()),
                ("b.jpg".to_string(), "dog".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_tree_returns_class_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dog")).unwrap();
        fs::write(dir.path().join("dog/b.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("cat")).unwrap();
        fs::write(dir.path().join("cat/a.jpg"), b"x").unwrap();

        let (samples, classes) = parse_classification_tree(dir.path()).unwrap();
        assert_eq!(classes, vec!["cat".to_string(), "dog".to_string()]);
        assert_eq!(samples.len(), 2);

        let targets: Vec<usize> = samples.iter().map(|(_, t)| *t).collect();
        assert_eq!(targets, vec![0, 1]);
    }
}
