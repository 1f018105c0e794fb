//! One raster image per selected page.

use super::host::Progress;
use super::job::{ExportPlan, ExportReport, ExportStatus};
use super::options::{ExportOptions, FailurePolicy};
use crate::error::Result;
use crate::model::{page_count, snapshot_page, PageSnapshot, SharedDocument};
use crate::render::{PageRenderer, Surface, POINTS_PER_INCH};
use std::path::{Path, PathBuf};

/// Insert `-n` before the final extension of `path`.
///
/// `None` returns the path unchanged; without an extension the number is
/// appended: `export.png` becomes `export-3.png`, `export` becomes
/// `export-3`.
pub fn filename_with_number(path: &Path, number: Option<usize>) -> PathBuf {
    let Some(number) = number else {
        return path.to_path_buf();
    };

    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(extension)) => {
            let mut name = stem.to_os_string();
            name.push(format!("-{}.", number));
            name.push(extension);
            path.with_file_name(name)
        }
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(format!("-{}", number));
            PathBuf::from(name)
        }
    }
}

pub(crate) fn run(
    document: &SharedDocument,
    plan: &ExportPlan,
    options: &ExportOptions,
    progress: &mut Progress<'_>,
    report: &mut ExportReport,
) -> Result<()> {
    let total = page_count(document)?;
    let range = options.range_for(total);
    let selected = range.materialize(total)?;

    if selected.is_empty() {
        log::info!("No pages selected, nothing to export");
        report.status = ExportStatus::NothingSelected;
        return Ok(());
    }

    // Files are numbered by position in the selection, not by page index.
    let single = range.is_single_page();
    let suppress_background = plan.descriptor.suppress_background();
    let renderer = PageRenderer::new();
    let mut first_error = None;

    progress.begin(selected.len());

    for (ordinal, index) in selected.into_iter().enumerate() {
        progress.checkpoint()?;

        let snapshot = snapshot_page(document, index)?;
        let target = filename_with_number(&plan.output, (!single).then_some(ordinal + 1));

        match render_page(&renderer, &snapshot, options.dpi, suppress_background, &target) {
            Ok(()) => {
                report.files.push(target);
                report.pages_written += 1;
            }
            Err(e) => {
                log::warn!("Page {} not exported: {}", index + 1, e);
                if options.failure_policy == FailurePolicy::FailFast {
                    return Err(e);
                }
                first_error.get_or_insert(e);
            }
        }

        progress.advance();
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn render_page(
    renderer: &PageRenderer,
    snapshot: &PageSnapshot,
    dpi: f32,
    suppress_background: bool,
    target: &Path,
) -> Result<()> {
    let mut surface = Surface::create(snapshot.page.width, snapshot.page.height, dpi)?;
    renderer.render(
        snapshot,
        &mut surface,
        dpi / POINTS_PER_INCH,
        suppress_background,
    );
    surface.persist(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_with_number() {
        assert_eq!(
            filename_with_number(Path::new("export.png"), Some(3)),
            PathBuf::from("export-3.png")
        );
        assert_eq!(
            filename_with_number(Path::new("export"), Some(3)),
            PathBuf::from("export-3")
        );
        assert_eq!(
            filename_with_number(Path::new("out/export.png"), None),
            PathBuf::from("out/export.png")
        );
        assert_eq!(
            filename_with_number(Path::new("out/archive.tar.png"), Some(12)),
            PathBuf::from("out/archive.tar-12.png")
        );
    }

    #[test]
    fn test_filename_dot_in_directory_only() {
        assert_eq!(
            filename_with_number(Path::new("v1.2/export"), Some(1)),
            PathBuf::from("v1.2/export-1")
        );
    }
}
