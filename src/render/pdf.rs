//! PDF content stream canvas.

use super::Canvas;
use crate::model::{Color, Point};
use lopdf::content::{Content, Operation};
use lopdf::Object;
use std::collections::BTreeSet;

/// Records drawing calls as PDF page content operators.
///
/// Coordinates arrive top-left based and are flipped into PDF's bottom-left
/// user space. Translucent colors reference `ExtGState` entries named by
/// [`PdfCanvas::alpha_state_name`]; the caller adds them to the page
/// resources from [`PdfCanvas::finish`].
pub struct PdfCanvas {
    page_height: f32,
    operations: Vec<Operation>,
    alphas: BTreeSet<u8>,
}

impl PdfCanvas {
    /// Create a canvas for a page of the given height in points.
    pub fn new(page_height: f32) -> Self {
        Self {
            page_height,
            operations: Vec::new(),
            alphas: BTreeSet::new(),
        }
    }

    /// Resource name of the graphics state for `alpha`.
    pub fn alpha_state_name(alpha: u8) -> String {
        format!("GA{}", alpha)
    }

    /// The recorded content and the alpha values it references.
    pub fn finish(self) -> (Content, BTreeSet<u8>) {
        (
            Content {
                operations: self.operations,
            },
            self.alphas,
        )
    }

    fn y(&self, y: f32) -> f32 {
        self.page_height - y
    }

    fn begin(&mut self, color: Color) {
        self.operations.push(Operation::new("q", vec![]));
        if color.a < 255 {
            self.alphas.insert(color.a);
            self.operations.push(Operation::new(
                "gs",
                vec![Object::Name(Self::alpha_state_name(color.a).into_bytes())],
            ));
        }
    }

    fn end(&mut self) {
        self.operations.push(Operation::new("Q", vec![]));
    }
}

fn components(color: Color) -> Vec<Object> {
    [color.r, color.g, color.b]
        .iter()
        .map(|&c| Object::from(c as f32 / 255.0))
        .collect()
}

impl Canvas for PdfCanvas {
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.begin(color);
        self.operations.push(Operation::new("rg", components(color)));
        self.operations.push(Operation::new(
            "re",
            vec![
                x.into(),
                self.y(y + height).into(),
                width.into(),
                height.into(),
            ],
        ));
        self.operations.push(Operation::new("f", vec![]));
        self.end();
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Color) {
        let Some(first) = points.first() else {
            return;
        };

        self.begin(color);
        self.operations.push(Operation::new("RG", components(color)));
        self.operations.push(Operation::new("w", vec![width.into()]));
        self.operations.push(Operation::new("J", vec![1.into()]));
        self.operations.push(Operation::new("j", vec![1.into()]));
        self.operations.push(Operation::new(
            "m",
            vec![first.x.into(), self.y(first.y).into()],
        ));
        if points.len() == 1 {
            // Zero-length segment with round caps renders as a dot.
            self.operations.push(Operation::new(
                "l",
                vec![first.x.into(), self.y(first.y).into()],
            ));
        }
        for p in &points[1..] {
            self.operations
                .push(Operation::new("l", vec![p.x.into(), self.y(p.y).into()]));
        }
        self.operations.push(Operation::new("S", vec![]));
        self.end();
    }
}
