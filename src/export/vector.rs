//! Multi-page vector document export.

use super::host::Progress;
use super::job::{ExportPlan, ExportReport, ExportStatus};
use super::options::ExportOptions;
use crate::error::{Error, Result};
use crate::model::{page_count, snapshot_page, SharedDocument};
use crate::output::write_atomically;
use crate::range::PageRange;
use crate::render::{PageRenderer, PdfCanvas};
use chrono::Utc;
use lopdf::{dictionary, Dictionary, Object, Stream};
use std::io;
use std::path::Path;

/// Backend producing one vector file for a set of pages.
pub trait VectorExport: Send {
    /// Leave page backgrounds out of the output.
    fn set_suppress_background(&mut self, suppress: bool);

    /// Write the pages selected by `range` to `path`.
    fn export(
        &mut self,
        document: &SharedDocument,
        path: &Path,
        range: &PageRange,
    ) -> std::result::Result<(), String>;
}

/// PDF backend built on lopdf.
#[derive(Debug, Clone, Default)]
pub struct PdfExport {
    suppress_background: bool,
    title: Option<String>,
    renderer: PageRenderer,
}

impl PdfExport {
    /// Create a PDF backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Title written to the document information dictionary. Falls back to
    /// the document's own title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Build the PDF in memory.
    pub fn build(&self, document: &SharedDocument, range: &PageRange) -> Result<lopdf::Document> {
        let total = page_count(document)?;
        let selected = range.materialize(total)?;
        if selected.is_empty() {
            return Err(Error::BackendExport("No pages selected for export".into()));
        }

        let mut pdf = lopdf::Document::with_version("1.4");
        let pages_id = pdf.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(selected.len());
        let mut title = self.title.clone();

        for index in selected {
            let snapshot = snapshot_page(document, index)?;
            let (width, height) = snapshot.page.dimensions();
            if !snapshot.page.has_valid_size() {
                return Err(Error::BackendExport(format!(
                    "Page {}: invalid page size {}x{}",
                    index + 1,
                    width,
                    height
                )));
            }

            let mut canvas = PdfCanvas::new(height);
            self.renderer
                .render(&snapshot, &mut canvas, 1.0, self.suppress_background);
            let (content, alphas) = canvas.finish();
            let bytes = content
                .encode()
                .map_err(|e| Error::BackendExport(format!("Page {}: {}", index + 1, e)))?;
            let content_id = pdf.add_object(Stream::new(dictionary! {}, bytes));

            let mut resources = Dictionary::new();
            if !alphas.is_empty() {
                let mut states = Dictionary::new();
                for alpha in alphas {
                    let value = alpha as f32 / 255.0;
                    states.set(
                        PdfCanvas::alpha_state_name(alpha),
                        dictionary! {
                            "Type" => "ExtGState",
                            "CA" => value,
                            "ca" => value,
                        },
                    );
                }
                resources.set("ExtGState", states);
            }

            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(page_id.into());
            log::debug!("Added page {} to PDF", index + 1);
        }

        if title.is_none() {
            title = document
                .read()
                .ok()
                .and_then(|doc| doc.metadata.title.clone());
        }

        let count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }
            .into(),
        );

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(concat!("inkport ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
        };
        if let Some(title) = title {
            info.set("Title", Object::string_literal(title));
        }
        let info_id = pdf.add_object(info);
        pdf.trailer.set("Info", info_id);

        Ok(pdf)
    }
}

impl VectorExport for PdfExport {
    fn set_suppress_background(&mut self, suppress: bool) {
        self.suppress_background = suppress;
    }

    fn export(
        &mut self,
        document: &SharedDocument,
        path: &Path,
        range: &PageRange,
    ) -> std::result::Result<(), String> {
        let mut pdf = self.build(document, range).map_err(|e| e.to_string())?;
        write_atomically(path, |w| {
            pdf.save_to(w).map_err(|e| io::Error::other(e.to_string()))
        })
        .map_err(|e| format!("Error writing PDF {}: {}", path.display(), e))
    }
}

pub(crate) fn run(
    backend: &mut dyn VectorExport,
    document: &SharedDocument,
    plan: &ExportPlan,
    options: &ExportOptions,
    progress: &mut Progress<'_>,
    report: &mut ExportReport,
) -> Result<()> {
    let total = page_count(document)?;
    let range = options.range_for(total);
    let selected = range.materialize(total)?.len();

    if selected == 0 {
        log::info!("No pages selected, nothing to export");
        report.status = ExportStatus::NothingSelected;
        return Ok(());
    }

    progress.begin(selected);
    progress.checkpoint()?;

    backend.set_suppress_background(plan.descriptor.suppress_background());
    backend
        .export(document, &plan.output, &range)
        .map_err(Error::BackendExport)?;

    progress.complete();
    report.files.push(plan.output.clone());
    report.pages_written = selected;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Background, Color, Document, Page, PaperStyle, Point, Stroke};

    fn sample(pages: usize) -> SharedDocument {
        let mut doc = Document::new();
        doc.metadata.title = Some("Sample".into());
        for i in 0..pages {
            let mut page = Page::letter();
            page.add_stroke(Stroke::highlighter(
                Color::rgb(255, 255, 0),
                8.0,
                vec![Point::new(10.0, 10.0 * i as f32), Point::new(100.0, 100.0)],
            ));
            doc.add_page(page);
        }
        doc.into_shared()
    }

    #[test]
    fn test_build_selected_pages() {
        let doc = sample(4);
        let range = PageRange::from_pairs([(1, 2)]).unwrap();
        let pdf = PdfExport::new().build(&doc, &range).unwrap();
        assert_eq!(pdf.get_pages().len(), 2);
    }

    #[test]
    fn test_build_empty_selection_fails() {
        let doc = sample(2);
        let err = PdfExport::new().build(&doc, &PageRange::new()).unwrap_err();
        assert!(matches!(err, Error::BackendExport(_)));
    }

    #[test]
    fn test_build_rejects_oversized_page() {
        for height in [1.0e9, f32::INFINITY] {
            let mut doc = Document::new();
            doc.add_page(Page::letter());
            doc.add_page(Page::new(100.0, height).with_background(Background::Solid {
                color: Color::WHITE,
                style: PaperStyle::Lined,
            }));
            let doc = doc.into_shared();

            let err = PdfExport::new()
                .build(&doc, &PageRange::all(2))
                .unwrap_err();
            assert!(matches!(err, Error::BackendExport(ref m) if m.starts_with("Page 2:")));
        }
    }

    #[test]
    fn test_export_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");

        let mut backend = PdfExport::new();
        backend.set_suppress_background(true);
        backend.export(&sample(3), &path, &PageRange::all(3)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
    }

    #[test]
    fn test_export_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("notes.pdf");
        let err = PdfExport::new()
            .export(&sample(1), &path, &PageRange::all(1))
            .unwrap_err();
        assert!(err.contains("notes.pdf"));
    }
}
