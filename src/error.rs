//! Error types for the polaroid-sheets library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SheetError`] — **Fatal**: the run cannot produce any output at all
//!   (no images survived ingestion, PDF assembly broke, the output file
//!   could not be written). Returned as `Err(SheetError)` from the top-level
//!   `generate*` functions.
//!
//! * [`CellError`] — **Non-fatal**: a single photo failed (bad decode,
//!   decode timeout) but the rest of the sheet is fine. The cell is left
//!   blank and recorded in [`crate::output::PageRecord`] so callers can
//!   inspect partial success rather than losing the whole sheet to one
//!   bad photo.
//!
//! Everything recoverable is "skip and continue"; everything else is
//! "abort and notify". No retries are attempted anywhere.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the polaroid-sheets library.
///
/// Per-photo failures use [`CellError`] and are stored in
/// [`crate::output::PageRecord`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Every input file was dropped during ingestion (or none were given).
    #[error(
        "No images to lay out: {attempted} file(s) attempted, {dropped} dropped.\n\
         Upload at least one readable image (JPEG, PNG, GIF, WebP, BMP, TIFF\n\
         or — with the `heif` feature — HEIC/HEIF)."
    )]
    NoImages { attempted: usize, dropped: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Export errors ─────────────────────────────────────────────────────
    /// The PDF assembly backend failed.
    #[error("PDF assembly failed: {detail}")]
    PdfAssembly { detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Print errors ──────────────────────────────────────────────────────
    /// The host print spooler rejected the document or is missing.
    #[error(
        "Failed to hand the sheets to the print spooler: {detail}\n\
         Check that a printer is configured (`lpstat -p` on most unix systems)."
    )]
    PrintSpoolerFailed { detail: String },

    /// No print dispatch path exists for this platform.
    #[error("Printing is not supported on this platform; use --output to export a PDF instead")]
    PrintUnsupported,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single polaroid cell.
///
/// Stored in [`crate::output::PageRecord`] when a cell fails. The sheet is
/// still composed with the failed cell left blank.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CellError {
    /// The cell's image could not be decoded from its data URI.
    #[error("Cell {index}: image decode failed: {detail}")]
    DecodeFailed { index: usize, detail: String },

    /// Decoding the cell's image exceeded the per-image budget.
    #[error("Cell {index}: image decode timed out after {secs}s")]
    Timeout { index: usize, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_images_display_includes_counts() {
        let e = SheetError::NoImages {
            attempted: 3,
            dropped: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 file(s) attempted"), "got: {msg}");
        assert!(msg.contains("3 dropped"), "got: {msg}");
    }

    #[test]
    fn output_write_failed_keeps_source() {
        let e = SheetError::OutputWriteFailed {
            path: PathBuf::from("/tmp/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/tmp/out.pdf"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn cell_timeout_display() {
        let e = CellError::Timeout { index: 4, secs: 5 };
        assert!(e.to_string().contains("Cell 4"));
        assert!(e.to_string().contains("5s"));
    }

    #[test]
    fn cell_error_round_trips_through_json() {
        let e = CellError::DecodeFailed {
            index: 1,
            detail: "truncated PNG".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: CellError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), e.to_string());
    }
}
