//! Document model for multi-page ink documents.
//!
//! Pages carry a background (solid paper or a page of an imported reference
//! document) and a stack of ink layers. The model is shared with export
//! workers through [`SharedDocument`].

mod document;
mod page;

pub use document::{
    page_count, snapshot_page, Document, Metadata, PageSnapshot, ReferenceDocument, ReferencePage,
    SharedDocument,
};
pub use page::{
    Background, Color, Element, Layer, Page, PaperStyle, Point, Stroke, Tool, HIGHLIGHTER_ALPHA,
    MAX_PAGE_DIMENSION,
};
