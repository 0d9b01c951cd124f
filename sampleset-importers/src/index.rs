//! Shared parsing for index-file dataset layouts
//!
//! Classification and detection indexes share the same on-disk shape:
//! a flat `data/` directory of images plus a `labels.json` of the form
//! `{"classes": [...]?, "labels": {"<uuid>": <target>, ...}}`, where each
//! uuid is the stem of a file under `data/`.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::directory::list_files;
use crate::error::{Error, Result};

/// The parsed contents of a `labels.json` index file
#[derive(Debug, Deserialize)]
pub(crate) struct LabelsIndex<T> {
    /// Optional class list; targets are indexes into it when present
    pub classes: Option<Vec<String>>,

    /// Per-item targets keyed by file stem
    #[serde(default = "BTreeMap::new")]
    pub labels: BTreeMap<String, T>,
}

/// Load and parse `<dataset_dir>/labels.json`
pub(crate) fn load_labels_index<T: DeserializeOwned>(dataset_dir: &Path) -> Result<LabelsIndex<T>> {
    let labels_path = dataset_dir.join("labels.json");
    let file = File::open(&labels_path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Map file stems to paths for the files under `<dataset_dir>/data`
pub(crate) fn data_paths_by_stem(dataset_dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let data_dir = dataset_dir.join("data");
    let mut map = HashMap::new();
    for path in list_files(&data_dir, false)? {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            map.insert(stem.to_string(), path);
        }
    }
    Ok(map)
}

/// A class target from an index file: a raw label string, or a class id
/// resolved through the index's class list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ClassTarget {
    /// An integer class id
    Id(u64),

    /// A label string, or a stringified class id when a class list is present
    Name(String),
}

impl ClassTarget {
    /// Resolve this target to a label string
    ///
    /// With a class list, the target is interpreted as an index into it
    /// (string targets are parsed as integers). Without one, string targets
    /// are the label itself and integer targets are stringified.
    pub fn resolve(&self, classes: Option<&[String]>) -> Result<String> {
        let Some(classes) = classes else {
            return Ok(match self {
                ClassTarget::Id(id) => id.to_string(),
                ClassTarget::Name(name) => name.clone(),
            });
        };

        let index = match self {
            ClassTarget::Id(id) => *id as usize,
            ClassTarget::Name(name) => name.parse::<usize>().map_err(|_| {
                Error::Format(format!(
                    "target '{name}' is not a valid class id for the provided class list"
                ))
            })?,
        };

        classes.get(index).cloned().ok_or_else(|| {
            Error::Format(format!(
                "class id {index} is out of range for a class list of length {}",
                classes.len()
            ))
        })
    }
}
