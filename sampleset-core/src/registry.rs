//! Process-wide dataset identity cache
//!
//! The registry guarantees at most one live [`Dataset`] instance per name:
//! the first `get_or_create` for a name constructs the dataset, every later
//! call returns a handle to the same shared instance. Entries are never
//! evicted; the cache lives exactly as long as the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::dataset::Dataset;
use crate::store::{MemoryBackend, StoreBackend};

/// The per-name dataset cache
pub struct DatasetRegistry {
    backend: Arc<dyn StoreBackend>,
    datasets: Mutex<HashMap<String, Dataset>>,
}

impl DatasetRegistry {
    /// Create a registry over the given store backend
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            datasets: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry backed by the in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Get the dataset with the given name, constructing it on first use
    ///
    /// Every call for the same name returns a handle to the identical
    /// instance, so mutations made through one handle are visible through
    /// all others.
    pub fn get_or_create(&self, name: &str) -> Dataset {
        let mut datasets = self.datasets.lock().expect("registry lock poisoned");
        datasets
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(dataset = name, "creating dataset");
                Dataset::new(name, self.backend.collection(name))
            })
            .clone()
    }

    /// The number of datasets constructed so far
    pub fn len(&self) -> usize {
        self.datasets.lock().expect("registry lock poisoned").len()
    }

    /// Whether no dataset has been constructed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelKind;
    use crate::schema::FieldKind;

    #[test]
    fn test_get_or_create_returns_identical_instance() {
        let registry = DatasetRegistry::in_memory();

        let first = registry.get_or_create("animals");
        let second = registry.get_or_create("animals");
        assert!(first.ptr_eq(&second));

        let other = registry.get_or_create("vehicles");
        assert!(!first.ptr_eq(&other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_schema_mutation_visible_across_handles() {
        let registry = DatasetRegistry::in_memory();

        let first = registry.get_or_create("animals");
        let second = registry.get_or_create("animals");

        first
            .add_field(
                "ground_truth",
                FieldKind::Embedded(LabelKind::Classification.into()),
            )
            .unwrap();

        assert!(second.get_schema(None).contains_key("ground_truth"));

        // And through a handle obtained after the mutation
        let third = registry.get_or_create("animals");
        assert!(third.get_schema(None).contains_key("ground_truth"));
    }

    #[test]
    fn test_records_visible_across_handles() {
        let registry = DatasetRegistry::in_memory();

        let first = registry.get_or_create("animals");
        let mut sample = crate::sample::Sample::new("/a.jpg");
        first.add_sample(&mut sample).unwrap();

        let second = registry.get_or_create("animals");
        assert_eq!(second.count().unwrap(), 1);
    }
}
