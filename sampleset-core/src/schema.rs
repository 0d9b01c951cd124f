//! Schema descriptors for dataset fields
//!
//! Every dataset carries a runtime-mutable mapping of field name to
//! [`FieldKind`]. Fields must be declared here before records using them are
//! inserted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::label::LabelKind;

/// Primitive scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Boolean values
    Boolean,

    /// 64-bit signed integers
    Int,

    /// 64-bit floating point values
    Float,

    /// UTF-8 strings
    String,
}

/// Embedded record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddedType {
    /// Media metadata
    Metadata,

    /// A label value of the given kind
    Label(LabelKind),
}

impl From<LabelKind> for EmbeddedType {
    fn from(kind: LabelKind) -> Self {
        EmbeddedType::Label(kind)
    }
}

/// Descriptor for the value kind of a schema field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// A primitive scalar
    Scalar(ScalarKind),

    /// An ordered sequence of values of one kind
    List(Box<FieldKind>),

    /// A mapping between two kinds
    Map(Box<FieldKind>, Box<FieldKind>),

    /// An embedded record
    Embedded(EmbeddedType),
}

impl FieldKind {
    /// Check whether this descriptor matches the given filter
    pub fn matches(&self, filter: KindFilter) -> bool {
        matches!(
            (self, filter),
            (FieldKind::Scalar(_), KindFilter::Scalar)
                | (FieldKind::List(_), KindFilter::List)
                | (FieldKind::Map(_, _), KindFilter::Map)
                | (FieldKind::Embedded(_), KindFilter::Embedded)
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "{kind:?}"),
            FieldKind::List(item) => write!(f, "List({item})"),
            FieldKind::Map(key, value) => write!(f, "Map({key} -> {value})"),
            FieldKind::Embedded(EmbeddedType::Metadata) => write!(f, "Embedded(Metadata)"),
            FieldKind::Embedded(EmbeddedType::Label(kind)) => write!(f, "Embedded({kind})"),
        }
    }
}

/// Filter over the [`FieldKind`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Primitive scalar fields
    Scalar,

    /// Sequence fields
    List,

    /// Mapping fields
    Map,

    /// Embedded record fields
    Embedded,
}

/// The schema of a dataset: field name to field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: BTreeMap<String, FieldKind>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Create a schema with the built-in sample fields
    ///
    /// Every dataset starts with `filepath`, `tags`, and `metadata`.
    pub fn with_builtin_fields() -> Self {
        let mut schema = Self::new();
        schema
            .fields
            .insert("filepath".to_string(), FieldKind::Scalar(ScalarKind::String));
        schema.fields.insert(
            "tags".to_string(),
            FieldKind::List(Box::new(FieldKind::Scalar(ScalarKind::String))),
        );
        schema.fields.insert(
            "metadata".to_string(),
            FieldKind::Embedded(EmbeddedType::Metadata),
        );
        schema
    }

    /// Get all fields, or only those matching the given filter
    pub fn fields(&self, filter: Option<KindFilter>) -> BTreeMap<String, FieldKind> {
        match filter {
            None => self.fields.clone(),
            Some(filter) => self
                .fields
                .iter()
                .filter(|(_, kind)| kind.matches(filter))
                .map(|(name, kind)| (name.clone(), kind.clone()))
                .collect(),
        }
    }

    /// Get the descriptor for a field, if declared
    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.fields.get(name)
    }

    /// Check whether a field is declared
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declare a new field
    ///
    /// Redeclaring a field with the same descriptor is a no-op; redeclaring
    /// it with a different descriptor is a schema mismatch.
    pub fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<()> {
        if let Some(existing) = self.fields.get(name) {
            if *existing == kind {
                return Ok(());
            }
            return Err(Error::SchemaMismatch(format!(
                "field '{name}' is already declared as {existing}, cannot redeclare as {kind}"
            )));
        }

        self.fields.insert(name.to_string(), kind);
        Ok(())
    }

    /// Remove a field from the schema
    ///
    /// Existing records holding values for the field are not revalidated.
    pub fn delete_field(&mut self, name: &str) -> Result<()> {
        if self.fields.remove(name).is_none() {
            return Err(Error::SchemaMismatch(format!(
                "field '{name}' does not exist"
            )));
        }
        Ok(())
    }

    /// The number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_fields() {
        let schema = Schema::with_builtin_fields();
        assert!(schema.has_field("filepath"));
        assert!(schema.has_field("tags"));
        assert!(schema.has_field("metadata"));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_filter_by_kind() {
        let mut schema = Schema::with_builtin_fields();
        schema
            .add_field(
                "ground_truth",
                FieldKind::Embedded(LabelKind::Classification.into()),
            )
            .unwrap();

        let embedded = schema.fields(Some(KindFilter::Embedded));
        assert_eq!(embedded.len(), 2);
        assert!(embedded.contains_key("metadata"));
        assert!(embedded.contains_key("ground_truth"));

        let scalars = schema.fields(Some(KindFilter::Scalar));
        assert_eq!(scalars.len(), 1);
        assert!(scalars.contains_key("filepath"));
    }

    #[test]
    fn test_redeclare_field() {
        let mut schema = Schema::new();
        let kind = FieldKind::Embedded(LabelKind::Detections.into());
        schema.add_field("predictions", kind.clone()).unwrap();

        // Same descriptor is a no-op
        schema.add_field("predictions", kind).unwrap();

        // Different descriptor is rejected
        let err = schema
            .add_field("predictions", FieldKind::Scalar(ScalarKind::Int))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_delete_missing_field() {
        let mut schema = Schema::new();
        assert!(matches!(
            schema.delete_field("nope"),
            Err(Error::SchemaMismatch(_))
        ));
    }
}
