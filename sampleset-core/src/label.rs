//! Polymorphic label values attached to samples
//!
//! Labels are a closed set of tagged variants. Samples store them under named
//! label fields; importers report which variant they produce via
//! [`LabelKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type tag for the label variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    /// A single class label
    Classification,

    /// A set of object detections
    Detections,

    /// A generic image-labels payload from an external reader
    ImageLabels,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Classification => write!(f, "Classification"),
            LabelKind::Detections => write!(f, "Detections"),
            LabelKind::ImageLabels => write!(f, "ImageLabels"),
        }
    }
}

/// A classification label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The class label string
    pub label: String,

    /// Optional confidence in `[0, 1]`
    pub confidence: Option<f64>,
}

impl Classification {
    /// Create a new classification label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: None,
        }
    }
}

/// A single object detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The class label string
    pub label: String,

    /// Relative `[x, y, width, height]` coordinates in `[0, 1] x [0, 1]`
    pub bounding_box: [f64; 4],

    /// Optional confidence in `[0, 1]`
    pub confidence: Option<f64>,
}

/// A set of object detections for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detections {
    /// The detections in this set
    pub detections: Vec<Detection>,
}

/// A generic image-labels payload
///
/// The payload is carried opaquely; its schema belongs to the external
/// labeled-dataset reader that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLabels {
    /// The raw labels payload
    pub labels: serde_json::Value,
}

/// A polymorphic label value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Label {
    /// A classification label
    Classification(Classification),

    /// A set of object detections
    Detections(Detections),

    /// A generic image-labels payload
    ImageLabels(ImageLabels),
}

impl Label {
    /// Get the type tag of this label
    pub fn kind(&self) -> LabelKind {
        match self {
            Label::Classification(_) => LabelKind::Classification,
            Label::Detections(_) => LabelKind::Detections,
            Label::ImageLabels(_) => LabelKind::ImageLabels,
        }
    }
}

impl From<Classification> for Label {
    fn from(label: Classification) -> Self {
        Label::Classification(label)
    }
}

impl From<Detections> for Label {
    fn from(label: Detections) -> Self {
        Label::Detections(label)
    }
}

impl From<ImageLabels> for Label {
    fn from(label: ImageLabels) -> Self {
        Label::ImageLabels(label)
    }
}
