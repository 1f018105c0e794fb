//! Off-screen raster surfaces.

use super::Canvas;
use crate::error::{Error, Result};
use crate::model::{Color, Point};
use crate::output::write_atomically;
use std::io::Write;
use std::path::Path;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Reference resolution of page space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Largest width or height, in pixels, a surface may have.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// A raster surface plus its drawing context, sized for one page.
///
/// Drawing happens in page points; the context is pre-scaled by
/// `dpi / 72`. The surface is consumed by [`Surface::persist`].
pub struct Surface {
    pixmap: Pixmap,
    transform: Transform,
}

impl Surface {
    /// Allocate a surface for a `width_pt` x `height_pt` page at `dpi`.
    pub fn create(width_pt: f32, height_pt: f32, dpi: f32) -> Result<Self> {
        let scale = dpi / POINTS_PER_INCH;
        let width = pixel_extent(width_pt * scale);
        let height = pixel_extent(height_pt * scale);

        if width == 0
            || height == 0
            || width > MAX_SURFACE_DIMENSION
            || height > MAX_SURFACE_DIMENSION
        {
            return Err(Error::InvalidSurface { width, height });
        }

        let pixmap = Pixmap::new(width, height).ok_or(Error::InvalidSurface { width, height })?;
        log::trace!("Created {}x{} surface at {} dpi", width, height, dpi);

        Ok(Self {
            pixmap,
            transform: Transform::from_scale(scale, scale),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Read back one pixel (straight alpha). `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> std::result::Result<Vec<u8>, String> {
        self.pixmap.encode_png().map_err(|e| e.to_string())
    }

    /// Encode the surface into the format named by `path`'s extension,
    /// write it, and release the surface.
    pub fn persist(self, path: &Path) -> Result<()> {
        let encode_error = |reason: String| Error::SurfaceEncode {
            path: path.to_path_buf(),
            reason,
        };

        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(encode_error("unsupported raster format".into()));
        }

        let data = self.encode_png().map_err(encode_error)?;
        write_atomically(path, |w| w.write_all(&data)).map_err(|e| encode_error(e.to_string()))?;
        log::debug!("Wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }
}

impl Canvas for Surface {
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            self.pixmap
                .fill_rect(rect, &Self::paint(color), self.transform, None);
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Color) {
        let paint = Self::paint(color);

        if let [only] = points {
            if let Some(dot) = PathBuilder::from_circle(only.x, only.y, width / 2.0) {
                self.pixmap
                    .fill_path(&dot, &paint, FillRule::Winding, self.transform, None);
            }
            return;
        }

        let mut builder = PathBuilder::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            builder.move_to(first.x, first.y);
        }
        for p in iter {
            builder.line_to(p.x, p.y);
        }
        let Some(path) = builder.finish() else {
            return;
        };

        let stroke = tiny_skia::Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, self.transform, None);
    }
}

fn pixel_extent(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil().min(u32::MAX as f32) as u32
    } else {
        0
    }
}
