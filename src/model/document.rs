//! Document-level types.

use super::{Element, Page};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A document shared between the owning context and export workers.
pub type SharedDocument = Arc<RwLock<Document>>;

/// A multi-page ink document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, dates)
    #[serde(default)]
    pub metadata: Metadata,

    /// Pages in the document
    pub pages: Vec<Page>,

    /// Externally sourced pages used as backgrounds
    #[serde(default)]
    pub reference: Option<ReferenceDocument>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the document for sharing with export jobs.
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by 0-based index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Reference page backing `page`, if it has one and it exists.
    pub fn reference_page_for(&self, page: &Page) -> Option<&ReferencePage> {
        let index = page.reference_page()?;
        self.reference.as_ref()?.pages.get(index)
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a JSON document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Snapshot of one page, with its reference background, taken under lock.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// 0-based page index
    pub index: usize,
    /// The page itself
    pub page: Page,
    /// Resolved reference background, if the page has one
    pub reference: Option<ReferencePage>,
}

/// Number of pages, read under a scoped lock.
pub fn page_count(document: &SharedDocument) -> Result<usize> {
    let doc = document
        .read()
        .map_err(|_| Error::Other("document lock poisoned".into()))?;
    Ok(doc.page_count())
}

/// Copy one page out of the shared document.
///
/// The read lock is held only while copying, so the owning context is never
/// blocked for longer than one page.
pub fn snapshot_page(document: &SharedDocument, index: usize) -> Result<PageSnapshot> {
    let doc = document.read().map_err(|_| Error::PageUnavailable(index))?;
    let page = doc.page(index).ok_or(Error::PageUnavailable(index))?;
    Ok(PageSnapshot {
        index,
        page: page.clone(),
        reference: doc.reference_page_for(page).cloned(),
    })
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

/// A paginated document whose pages underlie ink pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    /// File the reference pages were imported from
    pub source: Option<PathBuf>,

    /// Imported pages
    pub pages: Vec<ReferencePage>,
}

/// One imported background page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePage {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Content drawn as the page background
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl ReferencePage {
    /// Create an empty reference page.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Background, Color, Point, Stroke};

    fn doc_with_reference() -> Document {
        let mut reference = ReferencePage::new(612.0, 792.0);
        reference.elements.push(Element::Stroke(Stroke::new(
            Color::BLACK,
            1.0,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        )));

        let mut doc = Document::new();
        doc.reference = Some(ReferenceDocument {
            source: Some(PathBuf::from("scan.pdf")),
            pages: vec![reference],
        });
        doc.add_page(Page::letter().with_background(Background::Reference { page: 0 }));
        doc.add_page(Page::letter());
        doc
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_snapshot_resolves_reference() {
        let shared = doc_with_reference().into_shared();
        let snap = snapshot_page(&shared, 0).unwrap();
        assert_eq!(snap.index, 0);
        assert!(snap.reference.is_some());

        let snap = snapshot_page(&shared, 1).unwrap();
        assert!(snap.reference.is_none());

        assert!(matches!(
            snapshot_page(&shared, 2),
            Err(Error::PageUnavailable(2))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_backgrounds() {
        let doc = doc_with_reference();
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"type\": \"reference\""));
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_minimal_json() {
        let doc = Document::from_json(r#"{"pages":[{"width":100,"height":50}]}"#).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].background, Background::default());
    }
}
