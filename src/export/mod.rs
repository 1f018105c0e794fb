//! Export jobs and the strategies behind them.
//!
//! An [`ExportJob`] resolves its format label through the catalog, then runs
//! exactly one strategy:
//!
//! - raster: one PNG per selected page
//! - vector: one multi-page document through a [`VectorExport`] backend
//! - archive: the whole document through an [`ArchiveWriter`]
//!
//! [`ExportTask`] runs a job on a worker thread and finalizes it on the
//! caller's thread.

mod archive;
mod host;
mod job;
mod options;
mod raster;
mod task;
mod vector;

pub use archive::{to_xml as journal_xml, ArchiveWriter, JournalArchive, JOURNAL_VERSION};
pub use host::{CancelToken, ChannelHost, ExportHost, HostEvent, NullHost};
pub use job::{
    ExportContext, ExportJob, ExportPlan, ExportReport, ExportStatus, Exporters, JobState,
};
pub use options::{ExportOptions, FailurePolicy, DEFAULT_DPI};
pub use raster::filename_with_number;
pub use task::{ExportTask, WORKER_NAME};
pub use vector::{PdfExport, VectorExport};
