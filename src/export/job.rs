//! The export job: options, resolution and the state machine.

use super::archive::{self, ArchiveWriter, JournalArchive};
use super::host::{CancelToken, ExportHost, NullHost, Progress};
use super::options::ExportOptions;
use super::raster;
use super::vector::{self, PdfExport, VectorExport};
use crate::catalog::{ExportKind, FormatCatalog, FormatDescriptor};
use crate::error::{Error, ErrorKind, Result};
use crate::model::SharedDocument;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of an [`ExportJob`].
///
/// `Created -> ResolvingOptions -> Running -> {Succeeded, Failed} -> Finalized`.
/// Resolution failures go straight from `ResolvingOptions` to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Built, nothing resolved yet
    Created,
    /// Destination validated and format resolved
    ResolvingOptions,
    /// A strategy is producing output
    Running,
    /// The strategy completed
    Succeeded,
    /// Resolution or the strategy failed; see `last_error`
    Failed,
    /// The owning context has seen the outcome
    Finalized,
}

impl JobState {
    /// Whether the job has stopped running.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Finalized
        )
    }

    fn can_move_to(self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Created, ResolvingOptions)
                | (ResolvingOptions, Running)
                | (ResolvingOptions, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Succeeded, Finalized)
                | (Failed, Finalized)
        )
    }
}

/// What resolution decided: the format, its strategy and the final path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Resolved format
    pub descriptor: FormatDescriptor,
    /// Strategy chosen from the descriptor's extension
    pub kind: ExportKind,
    /// Destination with the format's extension applied
    pub output: PathBuf,
}

/// How a successful job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStatus {
    /// Output was written
    #[default]
    Exported,
    /// The range selected no pages; nothing was written
    NothingSelected,
}

/// Files produced by a job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// Files written, in page order
    pub files: Vec<PathBuf>,
    /// Pages that made it into the output
    pub pages_written: usize,
    /// Outcome of a successful run
    pub status: ExportStatus,
}

/// Backends for the vector and archive strategies.
pub struct Exporters {
    /// Multi-page vector backend
    pub vector: Box<dyn VectorExport>,
    /// Whole-document archive writer
    pub archive: Box<dyn ArchiveWriter>,
}

impl Default for Exporters {
    fn default() -> Self {
        Self {
            vector: Box::new(PdfExport::new()),
            archive: Box::new(JournalArchive::new()),
        }
    }
}

/// Everything a job needs to run besides its own options.
pub struct ExportContext {
    /// The document being exported
    pub document: SharedDocument,
    /// Formats available to the job
    pub catalog: Arc<FormatCatalog>,
    /// Backends for vector and archive output
    pub exporters: Exporters,
    /// Progress and failure sink
    pub host: Arc<dyn ExportHost>,
    /// Stop request checked between pages
    pub cancel: CancelToken,
}

impl ExportContext {
    /// Context with the default catalog and backends and a [`NullHost`].
    pub fn new(document: SharedDocument) -> Self {
        Self {
            document,
            catalog: Arc::new(FormatCatalog::with_defaults()),
            exporters: Exporters::default(),
            host: Arc::new(NullHost),
            cancel: CancelToken::new(),
        }
    }

    /// Set the host.
    pub fn with_host(mut self, host: Arc<dyn ExportHost>) -> Self {
        self.host = host;
        self
    }

    /// Set the format catalog.
    pub fn with_catalog(mut self, catalog: Arc<FormatCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the vector and archive backends.
    pub fn with_exporters(mut self, exporters: Exporters) -> Self {
        self.exporters = exporters;
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// One export of a document to one destination in one format.
#[derive(Debug, Clone)]
pub struct ExportJob {
    destination: PathBuf,
    format_label: String,
    options: ExportOptions,
    state: JobState,
    plan: Option<ExportPlan>,
    last_error: Option<String>,
    failure: Option<ErrorKind>,
    report: ExportReport,
}

impl ExportJob {
    /// Create a job exporting to `destination` in the format registered
    /// under `format_label`.
    pub fn new(destination: impl Into<PathBuf>, format_label: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            format_label: format_label.into(),
            options: ExportOptions::default(),
            state: JobState::Created,
            plan: None,
            last_error: None,
            failure: None,
            report: ExportReport::default(),
        }
    }

    /// Set the export options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Destination as given by the caller.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Label the format is resolved from.
    pub fn format_label(&self) -> &str {
        &self.format_label
    }

    /// Export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Message of the failure recorded by the job, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Classification of the recorded failure.
    pub fn failure(&self) -> Option<ErrorKind> {
        self.failure
    }

    /// The resolved plan, once resolution succeeded.
    pub fn plan(&self) -> Option<&ExportPlan> {
        self.plan.as_ref()
    }

    /// Files produced so far.
    pub fn report(&self) -> &ExportReport {
        &self.report
    }

    /// Whether the job ran to completion without a recorded failure.
    pub fn is_success(&self) -> bool {
        self.last_error.is_none()
            && matches!(self.state, JobState::Succeeded | JobState::Finalized)
    }

    /// Validate the destination and resolve the format.
    ///
    /// Runs once. Failures are recorded, move the job to `Failed` and are
    /// also returned.
    pub fn resolve(&mut self, catalog: &FormatCatalog, document: &SharedDocument) -> Result<()> {
        self.transition(JobState::ResolvingOptions)?;

        match self.build_plan(catalog, document) {
            Ok(plan) => {
                log::debug!(
                    "Resolved '{}' to {:?} at {}",
                    self.format_label,
                    plan.kind,
                    plan.output.display()
                );
                self.plan = Some(plan);
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Run the resolved strategy.
    ///
    /// Strategy failures are recorded and leave the job `Failed`; only
    /// calling this in the wrong state returns an error.
    pub fn run(&mut self, ctx: &mut ExportContext) -> Result<()> {
        self.transition(JobState::Running)?;

        let Some(plan) = self.plan.as_ref() else {
            self.record_failure(&Error::Other("export format was not resolved".into()));
            return Ok(());
        };

        log::info!(
            "Exporting to {} as '{}'",
            plan.output.display(),
            self.format_label
        );

        let mut progress = Progress::new(ctx.host.as_ref(), &ctx.cancel);
        let result = match plan.kind {
            ExportKind::RasterPerPage => raster::run(
                &ctx.document,
                plan,
                &self.options,
                &mut progress,
                &mut self.report,
            ),
            ExportKind::VectorDocument => vector::run(
                ctx.exporters.vector.as_mut(),
                &ctx.document,
                plan,
                &self.options,
                &mut progress,
                &mut self.report,
            ),
            ExportKind::LegacyArchive => archive::run(
                ctx.exporters.archive.as_mut(),
                &ctx.document,
                plan,
                &mut progress,
                &mut self.report,
            ),
        };

        match result {
            Ok(()) => {
                log::info!(
                    "Export finished: {} file(s), {} page(s)",
                    self.report.files.len(),
                    self.report.pages_written
                );
                self.state = JobState::Succeeded;
            }
            Err(e) => self.record_failure(&e),
        }
        Ok(())
    }

    /// Resolve, then run if resolution succeeded.
    pub fn execute(&mut self, ctx: &mut ExportContext) -> Result<()> {
        if self.state != JobState::Created {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: JobState::ResolvingOptions,
            });
        }
        if self.resolve(&ctx.catalog, &ctx.document).is_ok() {
            self.run(ctx)?;
        }
        Ok(())
    }

    /// Hand the outcome to the host. Call from the owning context.
    pub fn finalize(&mut self, host: &dyn ExportHost) -> Result<()> {
        self.transition(JobState::Finalized)?;

        if let Some(ref message) = self.last_error {
            host.report_failure(message);
        } else if self.options.refresh_preview {
            host.refresh_preview();
        }
        Ok(())
    }

    fn transition(&mut self, to: JobState) -> Result<()> {
        if !self.state.can_move_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    fn record_failure(&mut self, error: &Error) {
        log::warn!("Export to {} failed: {}", self.destination.display(), error);
        self.failure = Some(error.kind());
        self.last_error = Some(error.to_string());
        self.state = JobState::Failed;
    }

    fn build_plan(&self, catalog: &FormatCatalog, document: &SharedDocument) -> Result<ExportPlan> {
        validate_destination(&self.destination)?;

        let descriptor = catalog.resolve(&self.format_label)?;
        let kind = descriptor.kind();
        let output = apply_extension(&self.destination, catalog, descriptor.extension());

        if kind == ExportKind::RasterPerPage
            && !(self.options.dpi.is_finite() && self.options.dpi > 0.0)
        {
            return Err(Error::Other(format!(
                "Invalid resolution: {} dpi",
                self.options.dpi
            )));
        }

        let source = document
            .read()
            .map_err(|_| Error::Other("document lock poisoned".into()))?
            .reference
            .as_ref()
            .and_then(|r| r.source.clone());
        if let Some(source) = source {
            if same_file(&source, &output) {
                return Err(Error::InvalidDestination {
                    path: output,
                    reason: "would overwrite the background document".into(),
                });
            }
        }

        Ok(ExportPlan {
            descriptor,
            kind,
            output,
        })
    }
}

fn validate_destination(path: &Path) -> Result<()> {
    let refuse = |reason: &str| Error::InvalidDestination {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.file_name().is_none() {
        return Err(refuse("no file name"));
    }
    if path.is_dir() {
        return Err(refuse("is a directory"));
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let metadata = fs::metadata(parent).map_err(|_| refuse("directory does not exist"))?;
    if !metadata.is_dir() {
        return Err(refuse("parent is not a directory"));
    }
    if metadata.permissions().readonly() {
        return Err(refuse("directory is not writable"));
    }
    Ok(())
}

/// Strip a trailing known extension, then append `extension`.
fn apply_extension(path: &Path, catalog: &FormatCatalog, extension: &str) -> PathBuf {
    let base = match path.extension() {
        Some(ext) if catalog.is_known_extension(&format!(".{}", ext.to_string_lossy())) => {
            path.with_extension("")
        }
        _ => path.to_path_buf(),
    };

    let mut name: OsString = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(extension);
    base.with_file_name(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), canonical_target(b)) {
        (Ok(a), Some(b)) => a == b,
        _ => a == b,
    }
}

// The output may not exist yet; canonicalize its directory instead.
fn canonical_target(path: &Path) -> Option<PathBuf> {
    if let Ok(p) = fs::canonicalize(path) {
        return Some(p);
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}
