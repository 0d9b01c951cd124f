//! Datasets: identity, schema, CRUD, and bulk ingestion
//!
//! A [`Dataset`] is a named, homogeneous collection of samples backed by one
//! record-store collection. Handles are cheap clones over shared state, so a
//! schema mutation made through one handle is visible through every other
//! handle for the same dataset.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{Error, Result};
use crate::sample::{Sample, SampleId};
use crate::schema::{FieldKind, KindFilter, Schema};
use crate::store::{RecordStore, SampleDocument};

/// Returns the list of all dataset names process-wide.
///
/// Intentionally unimplemented: the store exposes no collection catalog yet,
/// and silently returning only the registry's cache would under-report.
pub fn list_dataset_names() -> Result<Vec<String>> {
    Err(Error::Unsupported(
        "listing all dataset names is not implemented".to_string(),
    ))
}

/// How a sample is addressed in `get`/`delete` calls
///
/// Records are addressed only by their store-assigned id. The numeric and
/// range forms exist so that positional addressing fails with a dedicated
/// error instead of being silently reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleKey {
    /// A store-assigned id
    Id(SampleId),

    /// A positional index (unsupported)
    Index(usize),

    /// A positional range (unsupported)
    Slice(Range<usize>),
}

impl From<SampleId> for SampleKey {
    fn from(id: SampleId) -> Self {
        SampleKey::Id(id)
    }
}

impl From<usize> for SampleKey {
    fn from(index: usize) -> Self {
        SampleKey::Index(index)
    }
}

impl From<Range<usize>> for SampleKey {
    fn from(range: Range<usize>) -> Self {
        SampleKey::Slice(range)
    }
}

struct DatasetInner {
    name: String,
    schema: RwLock<Schema>,
    store: Arc<dyn RecordStore>,
}

/// A named, schema-bearing collection of samples
#[derive(Clone)]
pub struct Dataset {
    inner: Arc<DatasetInner>,
}

impl Dataset {
    /// Construct a dataset bound to the given collection
    ///
    /// Construction goes through
    /// [`DatasetRegistry::get_or_create`](crate::registry::DatasetRegistry::get_or_create)
    /// so that each name maps to one live instance.
    pub(crate) fn new(name: &str, store: Arc<dyn RecordStore>) -> Self {
        Self {
            inner: Arc::new(DatasetInner {
                name: name.to_string(),
                schema: RwLock::new(Schema::with_builtin_fields()),
                store,
            }),
        }
    }

    /// The name of the dataset
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether two handles refer to the same dataset instance
    pub fn ptr_eq(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The number of samples currently stored
    pub fn count(&self) -> Result<usize> {
        self.inner.store.count()
    }

    /// Get the sample with the given id
    pub fn get(&self, key: impl Into<SampleKey>) -> Result<Sample> {
        let id = self.resolve_key(key.into())?;
        let doc = self
            .inner
            .store
            .find(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(Sample::from_document(doc, &self.inner.name))
    }

    /// Delete the sample with the given id
    pub fn delete(&self, key: impl Into<SampleKey>) -> Result<()> {
        let id = self.resolve_key(key.into())?;
        self.inner.store.delete(id)
    }

    fn resolve_key(&self, key: SampleKey) -> Result<SampleId> {
        match key {
            SampleKey::Id(id) => Ok(id),
            SampleKey::Index(_) => Err(Error::InvalidAddressing(
                "accessing samples by numeric index is not supported; use sample IDs instead"
                    .to_string(),
            )),
            SampleKey::Slice(_) => Err(Error::InvalidAddressing(
                "slicing datasets is not supported; use a view to slice samples".to_string(),
            )),
        }
    }

    /// Get the schema, or only the fields matching the given filter
    pub fn get_schema(&self, filter: Option<KindFilter>) -> BTreeMap<String, FieldKind> {
        self.inner
            .schema
            .read()
            .expect("schema lock poisoned")
            .fields(filter)
    }

    /// Declare a new field, effective immediately for all handles
    pub fn add_field(&self, name: &str, kind: FieldKind) -> Result<()> {
        self.inner
            .schema
            .write()
            .expect("schema lock poisoned")
            .add_field(name, kind)
    }

    /// Remove a field from the schema
    ///
    /// Existing records holding values for the field are not revalidated.
    pub fn delete_field(&self, name: &str) -> Result<()> {
        self.inner
            .schema
            .write()
            .expect("schema lock poisoned")
            .delete_field(name)
    }

    /// The set of distinct values the given field takes across the dataset
    pub fn distinct(&self, field: &str) -> Result<BTreeSet<String>> {
        self.inner.store.distinct(field)
    }

    /// The set of tags across all samples
    pub fn get_tags(&self) -> Result<BTreeSet<String>> {
        self.distinct("tags")
    }

    /// Run an aggregation pipeline on the dataset
    ///
    /// The stages are passed through to the store unmodified; the empty
    /// pipeline returns all records.
    pub fn aggregate(&self, stages: &[serde_json::Value]) -> Result<Vec<SampleDocument>> {
        self.inner.store.run_pipeline(stages)
    }

    /// Iterate over all samples in the dataset, in store order
    pub fn iter_samples(&self) -> Result<impl Iterator<Item = Sample> + '_> {
        let docs = self.inner.store.run_pipeline(&[])?;
        let name = self.inner.name.clone();
        Ok(docs
            .into_iter()
            .map(move |doc| Sample::from_document(doc, &name)))
    }

    /// Add one sample to the dataset
    ///
    /// If the sample is already bound to a dataset, an independent unbound
    /// copy is persisted instead and the original is left unmodified; the
    /// returned id is then the copy's id.
    pub fn add_sample(&self, sample: &mut Sample) -> Result<SampleId> {
        let ids = self.add_samples(std::slice::from_mut(sample))?;
        Ok(ids[0])
    }

    /// Add many samples to the dataset with one bulk insert
    ///
    /// The copy-on-foreign-ownership rule of [`Dataset::add_sample`] applies
    /// element-wise. Returned ids are in input order, and each input sample
    /// that was newly bound reflects its assigned id on return. A failure in
    /// the bulk call may leave a partial insert; there is no rollback.
    pub fn add_samples(&self, samples: &mut [Sample]) -> Result<Vec<SampleId>> {
        self.validate_fields(samples)?;

        let docs = samples
            .iter()
            .map(|sample| {
                if sample.is_bound() {
                    sample.copy().to_document()
                } else {
                    sample.to_document()
                }
            })
            .collect();

        let ids = self.inner.store.insert_many(docs)?;

        for (sample, id) in samples.iter_mut().zip(&ids) {
            if !sample.is_bound() {
                sample.bind(&self.inner.name, *id);
            }
        }

        debug!(
            dataset = %self.inner.name,
            count = ids.len(),
            "added samples"
        );
        Ok(ids)
    }

    fn validate_fields(&self, samples: &[Sample]) -> Result<()> {
        let schema = self.inner.schema.read().expect("schema lock poisoned");
        for sample in samples {
            for field in sample.labels().keys() {
                if !schema.has_field(field) {
                    return Err(Error::UndeclaredField {
                        field: field.clone(),
                        dataset: self.inner.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Delete one sample and unbind it
    pub fn delete_sample(&self, sample: &mut Sample) -> Result<()> {
        let id = sample.id().ok_or_else(|| {
            Error::InvalidAddressing("the sample is not bound to a dataset".to_string())
        })?;
        self.inner.store.delete(id)?;
        sample.unbind();
        Ok(())
    }

    /// Delete many samples by key, one delete per element
    pub fn delete_samples(&self, keys: impl IntoIterator<Item = SampleKey>) -> Result<()> {
        // One store call per id. A single bulk operation is a known future
        // optimization, not a contract.
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Delete all samples from the dataset
    pub fn clear(&self) -> Result<()> {
        let keys: Vec<SampleKey> = self
            .aggregate(&[])?
            .into_iter()
            .filter_map(|doc| doc.id.map(SampleKey::Id))
            .collect();
        self.delete_samples(keys)
    }

    /// Bulk-update all samples matching a view.
    ///
    /// Intentionally unimplemented: the view sublanguage is an external
    /// collaborator and no update contract has been settled.
    pub fn update_samples(&self) -> Result<()> {
        Err(Error::Unsupported(
            "bulk update of samples matching a view is not implemented".to_string(),
        ))
    }

    /// A string summary of the dataset: name, size, tags, and schema
    pub fn summary(&self) -> Result<String> {
        let fields = self.get_schema(None);
        let max_len = fields.keys().map(String::len).max().unwrap_or(0);

        let mut fields_str = String::new();
        for (name, kind) in &fields {
            let _ = writeln!(fields_str, "\t{:max_len$}: {}", name, kind);
        }

        Ok(format!(
            "Name:           {}\nNum samples:    {}\nTags:           {:?}\nSample Fields:\n{}",
            self.inner.name,
            self.count()?,
            self.get_tags()?,
            fields_str,
        ))
    }
}
