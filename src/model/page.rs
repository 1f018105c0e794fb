//! Page-level types.

use serde::{Deserialize, Serialize};

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Light blue used for paper ruling.
    pub const RULING: Color = Color::rgb(0x40, 0xa0, 0xff);
    /// Red used for the margin line of ruled paper.
    pub const MARGIN: Color = Color::rgb(0xff, 0x00, 0x80);

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbbaa` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A point in page space (points, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset, growing downwards
    pub y: f32,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Drawing tool that produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Opaque pen
    #[default]
    Pen,
    /// Translucent marker
    Highlighter,
}

impl Tool {
    /// Name used in archives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Pen => "pen",
            Tool::Highlighter => "highlighter",
        }
    }
}

/// Alpha applied to highlighter strokes.
pub const HIGHLIGHTER_ALPHA: u8 = 128;

/// A freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Tool used
    #[serde(default)]
    pub tool: Tool,
    /// Stroke color
    pub color: Color,
    /// Line width in points
    pub width: f32,
    /// Sampled points
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create a pen stroke.
    pub fn new(color: Color, width: f32, points: Vec<Point>) -> Self {
        Self {
            tool: Tool::Pen,
            color,
            width,
            points,
        }
    }

    /// Create a highlighter stroke.
    pub fn highlighter(color: Color, width: f32, points: Vec<Point>) -> Self {
        Self {
            tool: Tool::Highlighter,
            color,
            width,
            points,
        }
    }

    /// Color as it is painted, including the tool's translucency.
    pub fn effective_color(&self) -> Color {
        match self.tool {
            Tool::Pen => self.color,
            Tool::Highlighter => self.color.with_alpha(HIGHLIGHTER_ALPHA),
        }
    }
}

/// A drawable element on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Freehand ink
    Stroke(Stroke),
}

/// A layer of content, drawn in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Elements from bottom to top
    pub elements: Vec<Element>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stroke to the layer.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.elements.push(Element::Stroke(stroke));
    }
}

/// Ruling printed on plain paper backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStyle {
    /// No ruling
    #[default]
    Plain,
    /// Horizontal lines
    Lined,
    /// Horizontal lines plus a margin line
    Ruled,
    /// Square grid
    Graph,
}

impl PaperStyle {
    /// Name used in archives.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStyle::Plain => "plain",
            PaperStyle::Lined => "lined",
            PaperStyle::Ruled => "ruled",
            PaperStyle::Graph => "graph",
        }
    }
}

/// What lies underneath a page's own content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    /// Solid paper with optional ruling
    Solid {
        /// Paper color
        color: Color,
        /// Ruling
        #[serde(default)]
        style: PaperStyle,
    },
    /// A page of the document's reference document
    Reference {
        /// 0-based page in the reference document
        page: usize,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid {
            color: Color::WHITE,
            style: PaperStyle::Plain,
        }
    }
}

/// Largest page width or height, in points, a PDF viewer must accept.
pub const MAX_PAGE_DIMENSION: f32 = 14_400.0;

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Background below the layers
    #[serde(default)]
    pub background: Background,

    /// Content layers, bottom first
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Page {
    /// Create a new page with the given dimensions and a white background.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            layers: vec![Layer::new()],
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0) // 8.5 * 72, 11 * 72
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    /// Replace the background.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Add a stroke to the topmost layer, creating one if needed.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        if self.layers.is_empty() {
            self.layers.push(Layer::new());
        }
        if let Some(layer) = self.layers.last_mut() {
            layer.add_stroke(stroke);
        }
    }

    /// Index of the reference page backing this page, if any.
    pub fn reference_page(&self) -> Option<usize> {
        match self.background {
            Background::Reference { page } => Some(page),
            Background::Solid { .. } => None,
        }
    }

    /// Number of elements over all layers.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(|l| l.elements.len()).sum()
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Whether both dimensions are finite, positive and at most
    /// [`MAX_PAGE_DIMENSION`].
    pub fn has_valid_size(&self) -> bool {
        [self.width, self.height]
            .iter()
            .all(|d| d.is_finite() && *d > 0.0 && *d <= MAX_PAGE_DIMENSION)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::letter()
    }
}
