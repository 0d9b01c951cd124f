//! Ingestion orchestrator
//!
//! Drives an importer to completion under scoped acquisition, materializes
//! every yielded item into a sample, and persists them into the target
//! dataset with one bulk insert.

use std::path::{Path, PathBuf};

use tracing::info;

use sampleset_core::{Dataset, FieldKind, LabelKind, Sample, SampleId};

use crate::error::{Error, Result};
use crate::importer::{Capability, Importer, ImporterGuard};

/// Expand a leading `~` to the user's home directory
fn expand_user(path: &Path) -> PathBuf {
    let Some(home) = std::env::var_os("HOME") else {
        return path.to_path_buf();
    };

    if path == Path::new("~") {
        return PathBuf::from(home);
    }
    match path.strip_prefix("~") {
        Ok(rest) => PathBuf::from(home).join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Normalize a media path to an absolute, home-expanded form
pub(crate) fn normalize_path(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(expand_user(path))?)
}

/// Import the samples yielded by the given importer into the given dataset
///
/// For an unlabeled importer, `label_field` is ignored. For a labeled
/// importer, `label_field` names the sample field the labels land at and is
/// required; omitting it is a caller error reported as
/// [`Error::UnsupportedImporterType`]. The label field is declared in the
/// dataset's schema before insertion. Tags, if given, are attached to every
/// sample.
///
/// All items are materialized in memory before the single bulk insert; a
/// failure in that insert may leave a partial import behind.
///
/// Returns the ids of the added samples, in importer order.
pub fn import_samples(
    dataset: &Dataset,
    importer: &mut Importer,
    label_field: Option<&str>,
    tags: Option<&[String]>,
) -> Result<Vec<SampleId>> {
    match (importer.capability(), label_field) {
        (Capability::Unlabeled, _) => import_unlabeled(dataset, importer, tags),
        (Capability::Labeled(kind), Some(field)) => {
            import_labeled(dataset, importer, kind, field, tags)
        }
        (Capability::Labeled(kind), None) => Err(Error::UnsupportedImporterType(format!(
            "a label_field is required to import from a labeled importer producing {kind}"
        ))),
    }
}

fn import_unlabeled(
    dataset: &Dataset,
    importer: &mut Importer,
    tags: Option<&[String]>,
) -> Result<Vec<SampleId>> {
    let mut guard = ImporterGuard::open(importer)?;

    info!(dataset = dataset.name(), "parsing samples");
    let mut samples = Vec::new();
    while let Some(item) = guard.next_item()? {
        let filepath = normalize_path(&item.path)?;
        samples.push(
            Sample::new(filepath)
                .with_metadata(item.metadata)
                .with_tags(tags.unwrap_or_default().to_vec()),
        );
    }

    add_all(dataset, &mut samples)
}

fn import_labeled(
    dataset: &Dataset,
    importer: &mut Importer,
    label_kind: LabelKind,
    label_field: &str,
    tags: Option<&[String]>,
) -> Result<Vec<SampleId>> {
    // Declare the label field up front; undeclared fields are rejected at
    // insert time
    dataset.add_field(label_field, FieldKind::Embedded(label_kind.into()))?;

    let mut guard = ImporterGuard::open(importer)?;

    info!(dataset = dataset.name(), "parsing samples");
    let mut samples = Vec::new();
    while let Some(item) = guard.next_item()? {
        let label = item.label.ok_or_else(|| {
            Error::Format("a labeled importer yielded an item without a label".to_string())
        })?;
        let filepath = normalize_path(&item.path)?;
        samples.push(
            Sample::new(filepath)
                .with_metadata(item.metadata)
                .with_tags(tags.unwrap_or_default().to_vec())
                .with_label(label_field, label),
        );
    }

    add_all(dataset, &mut samples)
}

fn add_all(dataset: &Dataset, samples: &mut Vec<Sample>) -> Result<Vec<SampleId>> {
    info!(
        dataset = dataset.name(),
        count = samples.len(),
        "importing samples"
    );
    Ok(dataset.add_samples(samples)?)
}
