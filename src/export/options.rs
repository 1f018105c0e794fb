//! Export options and configuration.

use crate::range::PageRange;

/// Resolution used for raster export unless configured otherwise.
pub const DEFAULT_DPI: f32 = 300.0;

/// Options for one export job.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Pages to export; `None` selects the whole document
    pub range: Option<PageRange>,

    /// Raster resolution in dots per inch
    pub dpi: f32,

    /// What the raster export does after a page fails
    pub failure_policy: FailurePolicy,

    /// Ask the host to refresh its saved-state preview after success
    pub refresh_preview: bool,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page range.
    pub fn with_range(mut self, range: PageRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Export every page.
    pub fn with_all_pages(mut self) -> Self {
        self.range = None;
        self
    }

    /// Set the raster resolution.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable the post-export preview refresh.
    pub fn with_preview_refresh(mut self, refresh: bool) -> Self {
        self.refresh_preview = refresh;
        self
    }

    /// The configured range, or all `total` pages.
    pub fn range_for(&self, total: usize) -> PageRange {
        self.range.clone().unwrap_or_else(|| PageRange::all(total))
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            range: None,
            dpi: DEFAULT_DPI,
            failure_policy: FailurePolicy::Continue,
            refresh_preview: false,
        }
    }
}

/// Handling of a page that fails to render or persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Export the remaining pages and report the first failure
    #[default]
    Continue,
    /// Stop at the first failure
    FailFast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::new()
            .with_dpi(150.0)
            .with_range(PageRange::single(2))
            .with_failure_policy(FailurePolicy::FailFast)
            .with_preview_refresh(true);

        assert_eq!(options.dpi, 150.0);
        assert!(options.range.as_ref().unwrap().is_single_page());
        assert_eq!(options.failure_policy, FailurePolicy::FailFast);
        assert!(options.refresh_preview);
    }

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert_eq!(options.dpi, DEFAULT_DPI);
        assert_eq!(options.failure_policy, FailurePolicy::Continue);
        assert_eq!(options.range_for(3).materialize(3).unwrap().len(), 3);
    }
}
