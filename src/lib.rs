//! # inkport
//!
//! Background export of multi-page ink documents.
//!
//! A document is a stack of pages, each with a paper or reference-page
//! background and layers of pen and highlighter strokes. inkport writes a
//! chosen page range to:
//!
//! - one PNG image per page
//! - one multi-page PDF
//! - a gzip-compressed journal archive of the whole document
//!
//! ## Quick Start
//!
//! ```no_run
//! use inkport::{export_document, Document, ExportOptions, PageRange};
//!
//! fn main() -> inkport::Result<()> {
//!     let doc = Document::load("notes.json")?.into_shared();
//!
//!     let options = ExportOptions::new().with_range(PageRange::from_pairs([(0, 2)])?);
//!     let job = export_document(&doc, "notes.pdf", "PDF files", options)?;
//!
//!     match job.last_error() {
//!         Some(message) => eprintln!("{}", message),
//!         None => println!("Wrote {:?}", job.report().files),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Background export
//!
//! [`ExportTask`] runs the job on a worker thread. Progress reaches the
//! [`ExportHost`] while the worker runs; the outcome is reported when the
//! caller finishes the task.
//!
//! ```no_run
//! use inkport::{spawn_export, ChannelHost, Document, ExportOptions, HostEvent};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> inkport::Result<()> {
//! let doc = Document::load("notes.json")?.into_shared();
//! let (host, events) = ChannelHost::new();
//!
//! let mut task = spawn_export(&doc, "pages.png", "PNG graphics", ExportOptions::new(), Arc::new(host))?;
//! while !task.wait_timeout(Duration::from_millis(100)) {
//!     for event in events.try_iter() {
//!         if let HostEvent::Current(page) = event {
//!             println!("page {} done", page);
//!         }
//!     }
//! }
//! let job = task.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod export;
pub mod model;
pub mod range;
pub mod render;

mod output;

// Re-export commonly used types
pub use catalog::{ExportKind, FormatCatalog, FormatDescriptor};
pub use error::{Error, ErrorKind, Result};
pub use export::{
    filename_with_number, ArchiveWriter, CancelToken, ChannelHost, ExportContext, ExportHost,
    ExportJob, ExportOptions, ExportReport, ExportStatus, ExportTask, Exporters, FailurePolicy,
    HostEvent, JobState, JournalArchive, NullHost, PdfExport, VectorExport,
};
pub use model::{
    Background, Color, Document, Layer, Metadata, Page, PaperStyle, Point, SharedDocument,
    Stroke, Tool,
};
pub use range::{PageRange, PageRangeEntry};
pub use render::{Canvas, PageRenderer, Surface};

use std::path::PathBuf;
use std::sync::Arc;

/// Export `document` on the calling thread with the default formats.
///
/// The returned job is finalized. Export failures do not make this return
/// `Err`; they are recorded in [`ExportJob::last_error`].
///
/// # Example
///
/// ```no_run
/// use inkport::{export_document, Document, ExportOptions};
///
/// let doc = Document::load("notes.json").unwrap().into_shared();
/// let job = export_document(&doc, "notes", "PNG graphics", ExportOptions::new().with_dpi(150.0)).unwrap();
/// println!("{} files", job.report().files.len());
/// ```
pub fn export_document(
    document: &SharedDocument,
    destination: impl Into<PathBuf>,
    format_label: &str,
    options: ExportOptions,
) -> Result<ExportJob> {
    let mut job = ExportJob::new(destination, format_label).with_options(options);
    let mut context = ExportContext::new(Arc::clone(document));
    job.execute(&mut context)?;
    drop(context);
    job.finalize(&NullHost)?;
    Ok(job)
}

/// Start exporting `document` on a worker thread.
pub fn spawn_export(
    document: &SharedDocument,
    destination: impl Into<PathBuf>,
    format_label: &str,
    options: ExportOptions,
    host: Arc<dyn ExportHost>,
) -> Result<ExportTask> {
    let job = ExportJob::new(destination, format_label).with_options(options);
    let context = ExportContext::new(Arc::clone(document)).with_host(host);
    ExportTask::spawn(job, context)
}
