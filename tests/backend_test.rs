//! Integration tests for replaceable vector and archive backends.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use inkport::catalog::{LABEL_JOURNAL, LABEL_PDF, LABEL_PDF_PLAIN};
use inkport::{
    ArchiveWriter, Document, ErrorKind, ExportContext, ExportJob, ExportOptions, Exporters,
    FormatCatalog, JournalArchive, Page, PageRange, PdfExport, SharedDocument, VectorExport,
};

#[derive(Debug, Default)]
struct Calls {
    suppress_background: Option<bool>,
    exported: Vec<(PathBuf, Vec<usize>)>,
    prepared_pages: Option<usize>,
    saved: Vec<PathBuf>,
}

/// Mock vector backend recording its calls.
struct MockVector {
    calls: Arc<Mutex<Calls>>,
    fail_with: Option<&'static str>,
}

impl VectorExport for MockVector {
    fn set_suppress_background(&mut self, suppress: bool) {
        self.calls.lock().unwrap().suppress_background = Some(suppress);
    }

    fn export(
        &mut self,
        document: &SharedDocument,
        path: &Path,
        range: &PageRange,
    ) -> Result<(), String> {
        let total = document.read().unwrap().page_count();
        let pages = range
            .materialize(total)
            .map_err(|e| e.to_string())?
            .into_iter()
            .collect();
        self.calls
            .lock()
            .unwrap()
            .exported
            .push((path.to_path_buf(), pages));
        match self.fail_with {
            Some(message) => Err(message.to_string()),
            None => Ok(()),
        }
    }
}

/// Mock archive writer recording its calls.
struct MockArchive {
    calls: Arc<Mutex<Calls>>,
    fail_with: Option<&'static str>,
}

impl ArchiveWriter for MockArchive {
    fn prepare_save(&mut self, document: &Document) {
        self.calls.lock().unwrap().prepared_pages = Some(document.page_count());
    }

    fn save_to(&mut self, path: &Path) -> Result<(), String> {
        self.calls.lock().unwrap().saved.push(path.to_path_buf());
        match self.fail_with {
            Some(message) => Err(message.to_string()),
            None => Ok(()),
        }
    }
}

fn document(pages: usize) -> SharedDocument {
    let mut doc = Document::new();
    for _ in 0..pages {
        doc.add_page(Page::letter());
    }
    doc.into_shared()
}

fn context(
    doc: SharedDocument,
    fail_vector: Option<&'static str>,
    fail_archive: Option<&'static str>,
) -> (ExportContext, Arc<Mutex<Calls>>) {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let exporters = Exporters {
        vector: Box::new(MockVector {
            calls: Arc::clone(&calls),
            fail_with: fail_vector,
        }),
        archive: Box::new(MockArchive {
            calls: Arc::clone(&calls),
            fail_with: fail_archive,
        }),
    };
    (ExportContext::new(doc).with_exporters(exporters), calls)
}

#[test]
fn test_vector_backend_receives_range_and_flag() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, calls) = context(document(6), None, None);

    let mut job = ExportJob::new(dir.path().join("out"), LABEL_PDF_PLAIN).with_options(
        ExportOptions::new().with_range(PageRange::from_pairs([(4, 5), (1, 2)]).unwrap()),
    );
    job.execute(&mut ctx).unwrap();

    assert!(job.is_success());
    assert_eq!(job.report().pages_written, 4);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.suppress_background, Some(true));
    assert_eq!(
        calls.exported,
        vec![(dir.path().join("out.pdf"), vec![1, 2, 4, 5])]
    );
}

#[test]
fn test_vector_failure_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, _calls) = context(document(2), Some("Disk quota exceeded"), None);

    let mut job = ExportJob::new(dir.path().join("out"), LABEL_PDF);
    job.execute(&mut ctx).unwrap();

    assert_eq!(job.failure(), Some(ErrorKind::BackendExportFailure));
    assert_eq!(job.last_error(), Some("Disk quota exceeded"));
}

#[test]
fn test_archive_prepared_then_saved() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, calls) = context(document(3), None, None);

    let mut job = ExportJob::new(dir.path().join("out.pdf"), LABEL_JOURNAL)
        .with_options(ExportOptions::new().with_range(PageRange::single(0)));
    job.execute(&mut ctx).unwrap();

    assert!(job.is_success());
    let calls = calls.lock().unwrap();
    assert_eq!(calls.prepared_pages, Some(3));
    assert_eq!(calls.saved, vec![dir.path().join("out.jnl")]);
    assert!(calls.exported.is_empty());
}

#[test]
fn test_archive_failure_is_prefixed() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, _calls) = context(document(1), None, Some("read-only file system"));

    let mut job = ExportJob::new(dir.path().join("out"), LABEL_JOURNAL);
    job.execute(&mut ctx).unwrap();

    assert_eq!(job.state(), inkport::JobState::Failed);
    assert_eq!(
        job.last_error(),
        Some("Save file error: read-only file system")
    );
}

#[test]
fn test_custom_catalog_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = FormatCatalog::with_defaults();
    catalog.register("Bitmap images", ".bmp", false);

    let mut ctx = ExportContext::new(document(1)).with_catalog(Arc::new(catalog));
    let mut job = ExportJob::new(dir.path().join("scan"), "Bitmap images")
        .with_options(ExportOptions::new().with_dpi(36.0));
    job.execute(&mut ctx).unwrap();

    // Raster output only knows PNG.
    assert_eq!(job.failure(), Some(ErrorKind::SurfaceEncodeFailure));
    assert!(job.last_error().unwrap().contains("unsupported raster format"));
    assert!(!dir.path().join("scan.bmp").exists());
}

#[test]
fn test_default_backends_are_real() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = ExportContext::new(document(2)).with_exporters(Exporters {
        vector: Box::new(PdfExport::new().with_title("Custom title")),
        archive: Box::new(JournalArchive::new().with_compression(1)),
    });

    let mut job = ExportJob::new(dir.path().join("out"), LABEL_PDF);
    job.execute(&mut ctx).unwrap();
    assert!(job.is_success());

    let bytes = std::fs::read(dir.path().join("out.pdf")).unwrap();
    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    let info = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let title = pdf
        .get_dictionary(info)
        .unwrap()
        .get(b"Title")
        .unwrap()
        .as_str()
        .unwrap();
    assert_eq!(title, b"Custom title");
}
