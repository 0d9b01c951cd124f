//! Importer for a flat directory of images

use std::fs;
use std::path::{Path, PathBuf};

use sampleset_core::is_image_path;

use crate::error::{Error, Result};
use crate::importer::{maybe_metadata, ImportItem, ImportSource, ImporterState};

/// List the files under a directory, sorted by path
pub(crate) fn list_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if recursive {
                collect_files(&path, recursive, out)?;
            }
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Importer for a directory of images stored on disk
///
/// Enumerates the files under the root (optionally recursively) during
/// `setup`, keeping only files with an image MIME type. Yields
/// `(image_path, metadata?)` items.
pub struct ImageDirectoryImporter {
    dataset_dir: PathBuf,
    recursive: bool,
    compute_metadata: bool,
    state: ImporterState,
    filepaths: Vec<PathBuf>,
    pos: usize,
}

impl ImageDirectoryImporter {
    /// Create an importer over the given directory
    pub fn new<P: AsRef<Path>>(dataset_dir: P, recursive: bool, compute_metadata: bool) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_path_buf(),
            recursive,
            compute_metadata,
            state: ImporterState::Unopened,
            filepaths: Vec::new(),
            pos: 0,
        }
    }

    /// Whether this importer computes media metadata per item
    pub fn computes_metadata(&self) -> bool {
        self.compute_metadata
    }
}

impl ImportSource for ImageDirectoryImporter {
    fn state(&self) -> ImporterState {
        self.state
    }

    fn setup(&mut self) -> Result<()> {
        if self.state != ImporterState::Unopened {
            return Err(Error::Lifecycle(
                "setup may only run on an unopened importer".to_string(),
            ));
        }

        self.filepaths = list_files(&self.dataset_dir, self.recursive)?
            .into_iter()
            .filter(|p| is_image_path(p))
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

        let Some(path) = self.filepaths.get(self.pos).cloned() else {
            return Ok(None);
        };
        self.pos += 1;

        let metadata = maybe_metadata(self.compute_metadata, &path)?;
        Ok(Some(ImportItem {
            path,
            metadata,
            label: None,
        }))
    }

    fn len(&self) -> Result<usize> {
        if self.state == ImporterState::Unopened {
            return Err(Error::LengthUnknown("ImageDirectoryImporter"));
        }
        Ok(self.filepaths.len())
    }

    fn close(&mut self) {
        self.filepaths.clear();
        self.state = ImporterState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"\xFF\xD8\xFF\xE0imagedata").unwrap();
        fs::write(dir.path().join("b.png"), b"\x89PNG\r\n\x1a\nimagedata").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.gif"), b"GIF89aimagedata").unwrap();
        dir
    }

    fn drain(importer: &mut ImageDirectoryImporter) -> Vec<ImportItem> {
        importer.setup().unwrap();
        let mut items = Vec::new();
        while let Some(item) = importer.next_item().unwrap() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_filters_to_image_files() {
        let dir = fixture();
        let mut importer = ImageDirectoryImporter::new(dir.path(), false, false);
        let items = drain(&mut importer);

        let names: Vec<_> = items
            .iter()
            .map(|i| i.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
        assert!(items.iter().all(|i| i.metadata.is_none()));
    }

    #[test]
    fn test_recursive_traversal() {
        let dir = fixture();
        let mut importer = ImageDirectoryImporter::new(dir.path(), true, false);
        let items = drain(&mut importer);
        assert_eq!(items.len(), 3);
        assert!(items.iter().any(|i| i.path.ends_with("nested/c.gif")));
    }

    #[test]
    fn test_computes_metadata_when_requested() {
        let dir = fixture();
        let mut importer = ImageDirectoryImporter::new(dir.path(), false, true);
        let items = drain(&mut importer);

        let first = items[0].metadata.as_ref().unwrap();
        assert_eq!(first.mime_type, "image/jpeg");
        assert!(first.size_bytes > 0);
    }

    #[test]
    fn test_len_after_setup() {
        let dir = fixture();
        let mut importer = ImageDirectoryImporter::new(dir.path(), false, false);
        assert!(importer.len().is_err());
        importer.setup().unwrap();
        assert_eq!(importer.len().unwrap(), 2);
    }
}
