//! Importer protocol: scoped, lazily-iterated conversion of on-disk dataset
//! formats into per-sample items
//!
//! Importers move through three states: Unopened -> Open (via [`setup`]) ->
//! Closed (via [`close`]). Discovery happens in `setup`, iteration is lazy
//! and not restartable, and exhaustion is signaled by `Ok(None)` rather than
//! an error. [`ImporterGuard`] is the scoped-acquisition construct: it runs
//! `setup` on entry and guarantees `close` on every exit path, including
//! error returns and panics in the consuming scope.
//!
//! [`setup`]: ImportSource::setup
//! [`close`]: ImportSource::close

use std::path::{Path, PathBuf};

use sampleset_core::{ImageMetadata, Label, LabelKind};

use crate::classification::{ClassificationTreeImporter, ImageClassificationImporter};
use crate::detection::ImageDetectionImporter;
use crate::directory::ImageDirectoryImporter;
use crate::error::Result;
use crate::labels::LabeledImageAdapter;

/// Lifecycle state of an importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterState {
    /// Constructed; discovery has not run
    Unopened,

    /// `setup` has run; iteration may proceed
    Open,

    /// `close` has run; the importer cannot be reused
    Closed,
}

/// One item yielded by an importer
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// Path to the media on disk
    pub path: PathBuf,

    /// Media metadata, present when the importer computes it
    pub metadata: Option<ImageMetadata>,

    /// The label, present for labeled importers
    pub label: Option<Label>,
}

/// What an importer yields per sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `(path, metadata?)` items
    Unlabeled,

    /// `(path, metadata?, label)` items with the given label kind
    Labeled(LabelKind),
}

/// The shared iteration interface implemented by every importer variant
pub trait ImportSource {
    /// Current lifecycle state
    fn state(&self) -> ImporterState;

    /// Discover files and labels; transitions Unopened -> Open
    fn setup(&mut self) -> Result<()>;

    /// The next item, or `Ok(None)` once exhausted
    ///
    /// Exhaustion is sticky: every call after the last item returns
    /// `Ok(None)`.
    fn next_item(&mut self) -> Result<Option<ImportItem>>;

    /// The total number of samples this importer will yield
    ///
    /// Fails with [`Error::LengthUnknown`](crate::Error::LengthUnknown) when
    /// the count cannot be known ahead of iteration.
    fn len(&self) -> Result<usize>;

    /// Release resources; transitions to Closed
    fn close(&mut self);
}

/// The closed set of importer variants, dispatched by tag
pub enum Importer {
    /// Flat (optionally nested) directory of images
    ImageDirectory(ImageDirectoryImporter),

    /// Classification index: `data/` plus `labels.json`
    ImageClassification(ImageClassificationImporter),

    /// Classification directory tree: `<class>/<image>`
    ClassificationTree(ClassificationTreeImporter),

    /// Detection index: `data/` plus `labels.json` of detection lists
    ImageDetection(ImageDetectionImporter),

    /// Generic adapter over an external labeled-dataset reader
    LabeledImages(LabeledImageAdapter),
}

impl Importer {
    /// What this importer yields per sample
    pub fn capability(&self) -> Capability {
        match self {
            Importer::ImageDirectory(_) => Capability::Unlabeled,
            Importer::ImageClassification(_) | Importer::ClassificationTree(_) => {
                Capability::Labeled(LabelKind::Classification)
            }
            Importer::ImageDetection(_) => Capability::Labeled(LabelKind::Detections),
            Importer::LabeledImages(_) => Capability::Labeled(LabelKind::ImageLabels),
        }
    }

    /// Whether this importer computes media metadata per item
    pub fn has_metadata(&self) -> bool {
        match self {
            Importer::ImageDirectory(i) => i.computes_metadata(),
            Importer::ImageClassification(i) => i.computes_metadata(),
            Importer::ClassificationTree(i) => i.computes_metadata(),
            Importer::ImageDetection(i) => i.computes_metadata(),
            Importer::LabeledImages(i) => i.computes_metadata(),
        }
    }

    fn source_mut(&mut self) -> &mut dyn ImportSource {
        match self {
            Importer::ImageDirectory(i) => i,
            Importer::ImageClassification(i) => i,
            Importer::ClassificationTree(i) => i,
            Importer::ImageDetection(i) => i,
            Importer::LabeledImages(i) => i,
        }
    }

    fn source(&self) -> &dyn ImportSource {
        match self {
            Importer::ImageDirectory(i) => i,
            Importer::ImageClassification(i) => i,
            Importer::ClassificationTree(i) => i,
            Importer::ImageDetection(i) => i,
            Importer::LabeledImages(i) => i,
        }
    }
}

impl ImportSource for Importer {
    fn state(&self) -> ImporterState {
        self.source().state()
    }

    fn setup(&mut self) -> Result<()> {
        self.source_mut().setup()
    }

    fn next_item(&mut self) -> Result<Option<ImportItem>> {
        self.source_mut().next_item()
    }

    fn len(&self) -> Result<usize> {
        self.source().len()
    }

    fn close(&mut self) {
        self.source_mut().close();
    }
}

impl From<ImageDirectoryImporter> for Importer {
    fn from(importer: ImageDirectoryImporter) -> Self {
        Importer::ImageDirectory(importer)
    }
}

impl From<ImageClassificationImporter> for Importer {
    fn from(importer: ImageClassificationImporter) -> Self {
        Importer::ImageClassification(importer)
    }
}

impl From<ClassificationTreeImporter> for Importer {
    fn from(importer: ClassificationTreeImporter) -> Self {
        Importer::ClassificationTree(importer)
    }
}

impl From<ImageDetectionImporter> for Importer {
    fn from(importer: ImageDetectionImporter) -> Self {
        Importer::ImageDetection(importer)
    }
}

impl From<LabeledImageAdapter> for Importer {
    fn from(importer: LabeledImageAdapter) -> Self {
        Importer::LabeledImages(importer)
    }
}

/// Scoped acquisition of an importer
///
/// Opening runs `setup`; dropping the guard runs `close` exactly once, on
/// every exit path of the consuming scope. If `setup` itself fails, the
/// importer is closed before the error is returned.
pub struct ImporterGuard<'a> {
    importer: &'a mut Importer,
}

impl<'a> ImporterGuard<'a> {
    /// Open the importer for iteration
    pub fn open(importer: &'a mut Importer) -> Result<Self> {
        if let Err(err) = importer.setup() {
            importer.close();
            return Err(err);
        }
        Ok(Self { importer })
    }

    /// The next item, or `Ok(None)` once exhausted
    pub fn next_item(&mut self) -> Result<Option<ImportItem>> {
        self.importer.next_item()
    }

    /// The total number of samples, if known
    pub fn len(&self) -> Result<usize> {
        self.importer.len()
    }

    /// What the importer yields per sample
    pub fn capability(&self) -> Capability {
        self.importer.capability()
    }

    /// Whether the importer computes media metadata per item
    pub fn has_metadata(&self) -> bool {
        self.importer.has_metadata()
    }
}

impl Drop for ImporterGuard<'_> {
    fn drop(&mut self) {
        self.importer.close();
    }
}

pub(crate) fn maybe_metadata(compute: bool, path: &Path) -> Result<Option<ImageMetadata>> {
    if compute {
        Ok(Some(ImageMetadata::build_for(path)?))
    } else {
        Ok(None)
    }
}
