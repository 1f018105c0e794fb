//! Error types for inkport library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::export::JobState;

/// Result type alias for inkport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while exporting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The destination path cannot be written.
    #[error("Invalid destination {}: {reason}", path.display())]
    InvalidDestination {
        /// Offending path
        path: PathBuf,
        /// Why the path was refused
        reason: String,
    },

    /// No export format is registered under the given label.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// A rendered page could not be encoded or written.
    #[error("Error exporting page to {}: {reason}", path.display())]
    SurfaceEncode {
        /// Target file
        path: PathBuf,
        /// Encoder or file system message
        reason: String,
    },

    /// A drawing surface could not be allocated for the requested size.
    #[error("Cannot create a {width}x{height} pixel surface")]
    InvalidSurface {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// The vector backend or archive writer reported a failure.
    #[error("{0}")]
    BackendExport(String),

    /// The document could not be locked or the page does not exist.
    #[error("Page {0} is unavailable")]
    PageUnavailable(usize),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A job operation was requested in the wrong state.
    #[error("Cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state
        from: JobState,
        /// Requested state
        to: JobState,
    },

    /// The export was cancelled at a page boundary.
    #[error("Export cancelled")]
    Cancelled,

    /// Document (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Journal XML could not be written.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of [`Error`] for hosts and job bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Destination path refused
    InvalidDestination,
    /// Format label not registered
    UnknownFormat,
    /// A raster page could not be produced or written
    SurfaceEncodeFailure,
    /// Vector backend or archive writer failed
    BackendExportFailure,
    /// Page lookup or document lock failed
    PageUnavailable,
    /// Cancelled by the host
    Cancelled,
    /// Anything else
    Other,
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            Error::UnknownFormat(_) => ErrorKind::UnknownFormat,
            Error::SurfaceEncode { .. } | Error::InvalidSurface { .. } => {
                ErrorKind::SurfaceEncodeFailure
            }
            Error::BackendExport(_) => ErrorKind::BackendExportFailure,
            Error::PageUnavailable(_) | Error::PageOutOfRange(..) => ErrorKind::PageUnavailable,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io(_)
            | Error::InvalidPageRange(_)
            | Error::InvalidTransition { .. }
            | Error::Json(_)
            | Error::Xml(_)
            | Error::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Export cancelled");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::BackendExport("disk full".into());
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::UnknownFormat("x".into()).kind(),
            ErrorKind::UnknownFormat
        );
        assert_eq!(
            Error::InvalidSurface {
                width: 0,
                height: 0
            }
            .kind(),
            ErrorKind::SurfaceEncodeFailure
        );
        assert_eq!(Error::PageOutOfRange(3, 2).kind(), ErrorKind::PageUnavailable);
    }

    #[test]
    fn test_surface_encode_mentions_path() {
        let err = Error::SurfaceEncode {
            path: PathBuf::from("out/export-2.png"),
            reason: "permission denied".into(),
        };
        assert!(err.to_string().contains("export-2.png"));
        assert!(err.to_string().contains("permission denied"));
    }
}
