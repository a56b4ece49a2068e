//! Output types: per-page records and run statistics.
//!
//! [`ExportOutput`] is returned by the top-level `generate*` functions even
//! when individual cells or pages failed; callers inspect
//! [`ExportStats::skipped_pages`] and [`ExportStats::failed_cells`] for
//! partial-success detail instead of losing the whole run to one bad photo.

use crate::error::CellError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Record of a single A4 page attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-indexed page number, matching pagination order.
    pub page_num: usize,
    /// Images assigned to this page by the paginator.
    pub cell_count: usize,
    /// Cells left blank because their image failed to decode in time.
    pub cell_errors: Vec<CellError>,
    /// True when the whole page could not be composed and was skipped.
    pub skipped: bool,
    /// Reason for the skip, when `skipped` is true.
    pub skip_reason: Option<String>,
}

/// Statistics for a complete generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStats {
    /// Files the caller asked us to ingest.
    pub attempted_files: usize,
    /// Files that produced a renderable image.
    pub ingested_files: usize,
    /// Files dropped during ingestion (unreadable, undecodable, or legacy
    /// with no transcoder).
    pub dropped_files: usize,

    /// Pages the paginator produced.
    pub total_pages: usize,
    /// Pages actually written into the document.
    pub written_pages: usize,
    /// Pages skipped because their sheet could not be composed.
    pub skipped_pages: usize,
    /// Cells left blank across all written pages.
    pub failed_cells: usize,

    /// Wall-clock time spent reading and encoding input files.
    pub ingest_duration_ms: u64,
    /// Wall-clock time spent composing sheets and assembling the PDF.
    pub export_duration_ms: u64,
    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,

    /// Size of the assembled PDF in bytes.
    pub output_bytes: u64,
}

/// Result of a full generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutput {
    /// Where the PDF was written, when `generate_to_file` was used.
    pub path: Option<PathBuf>,
    /// Per-page records in page order.
    pub pages: Vec<PageRecord>,
    /// Aggregate statistics.
    pub stats: ExportStats,
    /// The assembled PDF. Not serialised; use `path` or write it yourself.
    #[serde(skip)]
    pub pdf: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serialises_without_pdf_bytes() {
        let out = ExportOutput {
            path: None,
            pages: vec![PageRecord {
                page_num: 1,
                cell_count: 15,
                cell_errors: vec![],
                skipped: false,
                skip_reason: None,
            }],
            stats: ExportStats {
                attempted_files: 15,
                ingested_files: 15,
                dropped_files: 0,
                total_pages: 1,
                written_pages: 1,
                skipped_pages: 0,
                failed_cells: 0,
                ingest_duration_ms: 12,
                export_duration_ms: 34,
                total_duration_ms: 46,
                output_bytes: 1024,
            },
            pdf: vec![0x25, 0x50, 0x44, 0x46],
        };

        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"written_pages\":1"));
        assert!(!json.contains("pdf"), "raw PDF bytes must not be serialised");

        let back: ExportOutput = serde_json::from_str(&json).unwrap();
        assert!(back.pdf.is_empty());
        assert_eq!(back.stats.output_bytes, 1024);
    }
}
