//! Record store adapter
//!
//! Datasets persist their records through the [`RecordStore`] trait, one
//! collection per dataset name. [`MemoryStore`] is the in-process
//! implementation; a document database adapter would implement the same
//! traits.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::label::Label;
use crate::metadata::ImageMetadata;
use crate::sample::SampleId;

/// A persisted sample record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDocument {
    /// The store-assigned id; `None` until persisted
    pub id: Option<SampleId>,

    /// The media path
    pub filepath: PathBuf,

    /// Media metadata, if computed
    pub metadata: Option<ImageMetadata>,

    /// Tags attached to the record
    pub tags: Vec<String>,

    /// Named label fields
    pub labels: BTreeMap<String, Label>,
}

/// Per-collection CRUD, counting, distinct-value queries, and pipeline
/// execution
pub trait RecordStore: Send + Sync {
    /// The number of records in this collection
    fn count(&self) -> Result<usize>;

    /// Find the record with the given id
    fn find(&self, id: SampleId) -> Result<Option<SampleDocument>>;

    /// Persist many records in one operation
    ///
    /// Returns the assigned ids in input order.
    fn insert_many(&self, docs: Vec<SampleDocument>) -> Result<Vec<SampleId>>;

    /// Remove the record with the given id
    ///
    /// Fails with [`Error::NotFound`] if no record has that id.
    fn delete(&self, id: SampleId) -> Result<()>;

    /// The set of distinct values the given field takes across the collection
    ///
    /// Array-valued fields contribute their elements.
    fn distinct(&self, field: &str) -> Result<BTreeSet<String>>;

    /// Execute an aggregation pipeline
    ///
    /// The empty pipeline returns all records unmodified.
    fn run_pipeline(&self, stages: &[serde_json::Value]) -> Result<Vec<SampleDocument>>;
}

/// Hands out one collection handle per dataset name
pub trait StoreBackend: Send + Sync {
    /// Get (or create) the collection for the given dataset name
    fn collection(&self, name: &str) -> Arc<dyn RecordStore>;
}

/// An in-process record store collection
///
/// Records are kept in insertion order, which is also the order
/// `run_pipeline(&[])` returns them in.
pub struct MemoryStore {
    docs: Mutex<Vec<SampleDocument>>,
}

impl MemoryStore {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn count(&self) -> Result<usize> {
        Ok(self.docs.lock().expect("store lock poisoned").len())
    }

    fn find(&self, id: SampleId) -> Result<Option<SampleDocument>> {
        let docs = self.docs.lock().expect("store lock poisoned");
        Ok(docs.iter().find(|d| d.id == Some(id)).cloned())
    }

    fn insert_many(&self, docs: Vec<SampleDocument>) -> Result<Vec<SampleId>> {
        let mut stored = self.docs.lock().expect("store lock poisoned");
        let mut ids = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let id = SampleId::generate();
            doc.id = Some(id);
            stored.push(doc);
            ids.push(id);
        }
        Ok(ids)
    }

    fn delete(&self, id: SampleId) -> Result<()> {
        let mut docs = self.docs.lock().expect("store lock poisoned");
        let position = docs
            .iter()
            .position(|d| d.id == Some(id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        docs.remove(position);
        Ok(())
    }

    fn distinct(&self, field: &str) -> Result<BTreeSet<String>> {
        let docs = self.docs.lock().expect("store lock poisoned");

        let mut values = BTreeSet::new();
        for doc in docs.iter() {
            let rendered = serde_json::to_value(doc)?;
            if let Some(value) = rendered.get(field) {
                collect_distinct(value, &mut values);
            }
        }
        Ok(values)
    }

    fn run_pipeline(&self, stages: &[serde_json::Value]) -> Result<Vec<SampleDocument>> {
        if !stages.is_empty() {
            return Err(Error::Unsupported(
                "the in-memory store does not execute aggregation stages".to_string(),
            ));
        }

        let docs = self.docs.lock().expect("store lock poisoned");
        Ok(docs.clone())
    }
}

fn collect_distinct(value: &serde_json::Value, out: &mut BTreeSet<String>) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => {
            out.insert(s.clone());
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_distinct(item, out);
            }
        }
        other => {
            out.insert(other.to_string());
        }
    }
}

/// An in-process store backend
///
/// Collections persist for the lifetime of the backend, so re-opening a
/// dataset by name sees its existing records.
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryBackend {
    /// Create a backend with no collections
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryBackend {
    fn collection(&self, name: &str) -> Arc<dyn RecordStore> {
        let mut collections = self.collections.lock().expect("backend lock poisoned");
        collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new()))
            .clone()
    }
}
