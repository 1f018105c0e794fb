//! Export format catalog.
//!
//! The catalog maps the label a user picks (for example "PNG graphics") to
//! the output extension and whether the page background is left out. The
//! extension in turn decides which export strategy runs.
//!
//! # Example
//!
//! ```
//! use inkport::catalog::{ExportKind, FormatCatalog};
//!
//! let catalog = FormatCatalog::with_defaults();
//! let format = catalog.resolve("PNG with transparent background").unwrap();
//! assert_eq!(format.extension(), ".png");
//! assert!(format.suppress_background());
//! assert_eq!(format.kind(), ExportKind::RasterPerPage);
//! ```

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Extension of the legacy journal archive format.
pub const LEGACY_EXTENSION: &str = ".jnl";

/// Extension of the vector document format.
pub const VECTOR_EXTENSION: &str = ".pdf";

/// Label of the default vector export.
pub const LABEL_PDF: &str = "PDF files";
/// Label of the vector export without page backgrounds.
pub const LABEL_PDF_PLAIN: &str = "PDF with plain background";
/// Label of the per-page raster export.
pub const LABEL_PNG: &str = "PNG graphics";
/// Label of the per-page raster export without page backgrounds.
pub const LABEL_PNG_TRANSPARENT: &str = "PNG with transparent background";
/// Label of the legacy archive export.
pub const LABEL_JOURNAL: &str = "Journal archive (compatibility)";

/// Which export strategy handles a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// One multi-page vector document
    VectorDocument,
    /// One raster image per selected page
    RasterPerPage,
    /// Whole-document legacy archive
    LegacyArchive,
}

impl ExportKind {
    /// Pick the strategy for an extension (with leading dot).
    pub fn from_extension(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case(LEGACY_EXTENSION) {
            ExportKind::LegacyArchive
        } else if extension.eq_ignore_ascii_case(VECTOR_EXTENSION) {
            ExportKind::VectorDocument
        } else {
            ExportKind::RasterPerPage
        }
    }
}

/// Output extension and background handling for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    extension: String,
    suppress_background: bool,
}

impl FormatDescriptor {
    /// Create a descriptor. A missing leading dot is added.
    pub fn new(extension: impl Into<String>, suppress_background: bool) -> Self {
        let mut extension = extension.into();
        if !extension.starts_with('.') {
            extension.insert(0, '.');
        }
        Self {
            extension,
            suppress_background,
        }
    }

    /// Output extension, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the background layer is left out of the output.
    pub fn suppress_background(&self) -> bool {
        self.suppress_background
    }

    /// Strategy selected by the extension.
    pub fn kind(&self) -> ExportKind {
        ExportKind::from_extension(&self.extension)
    }
}

/// Registry of export formats keyed by user-visible label.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalog {
    entries: Vec<(String, FormatDescriptor)>,
    by_label: HashMap<String, usize>,
}

impl FormatCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in PDF, PNG and journal formats.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(LABEL_PDF, VECTOR_EXTENSION, false);
        catalog.register(LABEL_PDF_PLAIN, VECTOR_EXTENSION, true);
        catalog.register(LABEL_PNG, ".png", false);
        catalog.register(LABEL_PNG_TRANSPARENT, ".png", true);
        catalog.register(LABEL_JOURNAL, LEGACY_EXTENSION, false);
        catalog
    }

    /// Register a format. Re-registering a label replaces it in place.
    pub fn register(
        &mut self,
        label: impl Into<String>,
        extension: impl Into<String>,
        suppress_background: bool,
    ) {
        let label = label.into();
        let descriptor = FormatDescriptor::new(extension, suppress_background);
        match self.by_label.get(&label) {
            Some(&index) => self.entries[index].1 = descriptor,
            None => {
                self.by_label.insert(label.clone(), self.entries.len());
                self.entries.push((label, descriptor));
            }
        }
    }

    /// Look up a label exactly as given.
    pub fn resolve(&self, label: &str) -> Result<FormatDescriptor> {
        self.by_label
            .get(label)
            .map(|&index| self.entries[index].1.clone())
            .ok_or_else(|| Error::UnknownFormat(label.to_string()))
    }

    /// Labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Labels and descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormatDescriptor)> {
        self.entries
            .iter()
            .map(|(label, descriptor)| (label.as_str(), descriptor))
    }

    /// Whether `extension` (with leading dot) belongs to a registered format.
    pub fn is_known_extension(&self, extension: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.extension.eq_ignore_ascii_case(extension))
    }

    /// Number of registered formats.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no formats are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_with_defaults() {
        let catalog = FormatCatalog::with_defaults();
        assert_eq!(catalog.len(), 5);

        let pdf = catalog.resolve(LABEL_PDF).unwrap();
        assert_eq!(pdf.kind(), ExportKind::VectorDocument);
        assert!(!pdf.suppress_background());

        let plain = catalog.resolve(LABEL_PDF_PLAIN).unwrap();
        assert!(plain.suppress_background());

        let journal = catalog.resolve(LABEL_JOURNAL).unwrap();
        assert_eq!(journal.kind(), ExportKind::LegacyArchive);
    }

    #[test]
    fn test_resolve_is_exact() {
        let catalog = FormatCatalog::with_defaults();
        assert!(matches!(
            catalog.resolve("png graphics"),
            Err(Error::UnknownFormat(_))
        ));
        assert!(catalog.resolve(" PNG graphics").is_err());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut catalog = FormatCatalog::new();
        catalog.register("A", "png", false);
        catalog.register("B", ".pdf", false);
        catalog.register("A", ".bmp", true);

        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = catalog.resolve("A").unwrap();
        assert_eq!(a.extension(), ".bmp");
        assert!(a.suppress_background());
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ExportKind::from_extension(".pdf"), ExportKind::VectorDocument);
        assert_eq!(ExportKind::from_extension(".PDF"), ExportKind::VectorDocument);
        assert_eq!(ExportKind::from_extension(".jnl"), ExportKind::LegacyArchive);
        assert_eq!(ExportKind::from_extension(".png"), ExportKind::RasterPerPage);
        assert_eq!(ExportKind::from_extension(".tiff"), ExportKind::RasterPerPage);
    }

    #[test]
    fn test_known_extensions() {
        let catalog = FormatCatalog::with_defaults();
        assert!(catalog.is_known_extension(".png"));
        assert!(catalog.is_known_extension(".PNG"));
        assert!(!catalog.is_known_extension(".txt"));
    }
}
