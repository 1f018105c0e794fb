//! Rendering of document pages onto drawing targets.
//!
//! [`PageRenderer`] knows how a page is composed (background first, ink on
//! top). Drawing targets implement [`Canvas`]: the raster [`Surface`] used
//! for per-page images and the [`PdfCanvas`] used for vector documents.

mod page;
mod pdf;
mod surface;

pub use page::{PageRenderer, GRAPH_SPACING, LINE_SPACING, MARGIN_X, TOP_MARGIN};
pub use pdf::PdfCanvas;
pub use surface::{Surface, MAX_SURFACE_DIMENSION, POINTS_PER_INCH};

use crate::model::{Color, Point};

/// A drawing context working in page points, origin top-left.
pub trait Canvas {
    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    /// Stroke connected line segments with round caps and joins.
    ///
    /// A single point draws a dot of diameter `width`.
    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Color);
}
