//! Page compositing.

use super::Canvas;
use crate::model::{
    Background, Color, Element, PageSnapshot, PaperStyle, Point, ReferencePage, MAX_PAGE_DIMENSION,
};

/// Distance between lines on lined and ruled paper, in points.
pub const LINE_SPACING: f32 = 24.0;
/// Blank band above the first line on lined and ruled paper.
pub const TOP_MARGIN: f32 = 80.0;
/// Horizontal position of the margin line on ruled paper.
pub const MARGIN_X: f32 = 72.0;
/// Cell size of graph paper (5 mm).
pub const GRAPH_SPACING: f32 = 14.17;

const RULING_WIDTH: f32 = 0.5;

/// Number of rules at `start + i * step` lying strictly before `extent`.
/// Pages larger than [`MAX_PAGE_DIMENSION`] get no ruling.
fn rule_count(start: f32, step: f32, extent: f32) -> usize {
    if !(extent > start && extent <= MAX_PAGE_DIMENSION) {
        return 0;
    }
    ((extent - start) / step).ceil() as usize
}

/// Draws one page: background layer, then the page's own ink.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRenderer {
    _private: (),
}

impl PageRenderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Render `snapshot` onto `canvas`.
    ///
    /// `zoom` is the device pixels per point of the target; strokes thinner
    /// than one device pixel are widened so they stay visible. With
    /// `suppress_background` only the ink layers are drawn.
    pub fn render(
        &self,
        snapshot: &PageSnapshot,
        canvas: &mut dyn Canvas,
        zoom: f32,
        suppress_background: bool,
    ) {
        let page = &snapshot.page;
        let min_width = if zoom > 0.0 { 1.0 / zoom } else { 0.0 };

        if !suppress_background {
            match (&page.background, &snapshot.reference) {
                (Background::Reference { .. }, Some(reference)) => {
                    self.draw_reference(reference, page.width, page.height, canvas, min_width);
                }
                (Background::Reference { page: missing }, None) => {
                    log::warn!(
                        "Page {}: reference page {} not found, drawing blank paper",
                        snapshot.index,
                        missing
                    );
                    canvas.fill_rect(0.0, 0.0, page.width, page.height, Color::WHITE);
                }
                (Background::Solid { color, style }, _) => {
                    self.draw_paper(*color, *style, page.width, page.height, canvas);
                }
            }
        }

        for layer in &page.layers {
            for element in &layer.elements {
                draw_element(element, canvas, 1.0, 1.0, min_width);
            }
        }
    }

    fn draw_paper(
        &self,
        color: Color,
        style: PaperStyle,
        width: f32,
        height: f32,
        canvas: &mut dyn Canvas,
    ) {
        canvas.fill_rect(0.0, 0.0, width, height, color);

        match style {
            PaperStyle::Plain => {}
            PaperStyle::Lined | PaperStyle::Ruled => {
                for i in 0..rule_count(TOP_MARGIN, LINE_SPACING, height) {
                    let y = TOP_MARGIN + i as f32 * LINE_SPACING;
                    canvas.stroke_polyline(
                        &[Point::new(0.0, y), Point::new(width, y)],
                        RULING_WIDTH,
                        Color::RULING,
                    );
                }
                if style == PaperStyle::Ruled {
                    canvas.stroke_polyline(
                        &[Point::new(MARGIN_X, 0.0), Point::new(MARGIN_X, height)],
                        RULING_WIDTH,
                        Color::MARGIN,
                    );
                }
            }
            PaperStyle::Graph => {
                for i in 0..rule_count(GRAPH_SPACING, GRAPH_SPACING, width) {
                    let x = GRAPH_SPACING + i as f32 * GRAPH_SPACING;
                    canvas.stroke_polyline(
                        &[Point::new(x, 0.0), Point::new(x, height)],
                        RULING_WIDTH,
                        Color::RULING,
                    );
                }
                for i in 0..rule_count(GRAPH_SPACING, GRAPH_SPACING, height) {
                    let y = GRAPH_SPACING + i as f32 * GRAPH_SPACING;
                    canvas.stroke_polyline(
                        &[Point::new(0.0, y), Point::new(width, y)],
                        RULING_WIDTH,
                        Color::RULING,
                    );
                }
            }
        }
    }

    /// Draw an imported page stretched over the ink page.
    fn draw_reference(
        &self,
        reference: &ReferencePage,
        width: f32,
        height: f32,
        canvas: &mut dyn Canvas,
        min_width: f32,
    ) {
        canvas.fill_rect(0.0, 0.0, width, height, Color::WHITE);

        let sx = if reference.width > 0.0 { width / reference.width } else { 1.0 };
        let sy = if reference.height > 0.0 { height / reference.height } else { 1.0 };
        for element in &reference.elements {
            draw_element(element, canvas, sx, sy, min_width);
        }
    }
}

fn draw_element(element: &Element, canvas: &mut dyn Canvas, sx: f32, sy: f32, min_width: f32) {
    match element {
        Element::Stroke(stroke) => {
            if stroke.points.is_empty() {
                return;
            }
            let width = (stroke.width * sx.min(sy)).max(min_width);
            if sx == 1.0 && sy == 1.0 {
                canvas.stroke_polyline(&stroke.points, width, stroke.effective_color());
            } else {
                let scaled: Vec<Point> = stroke
                    .points
                    .iter()
                    .map(|p| Point::new(p.x * sx, p.y * sy))
                    .collect();
                canvas.stroke_polyline(&scaled, width, stroke.effective_color());
            }
        }
    }
}
