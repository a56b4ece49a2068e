//! # polaroid-sheets
//!
//! Batch photos into print-ready A4 sheets of polaroid-style cells.
//!
//! ## Why this crate?
//!
//! Printing a stack of phone photos means fighting a word processor's page
//! margins or a photo editor's export dialog, fifteen times per sheet.
//! This crate does the whole layout in one pass: photos land in a fixed
//! 3 × 5 grid per A4 page, each rotated 90° and cover-cropped into its
//! cell, and the pages come out as a single multi-page PDF — or go straight
//! to the system print spooler.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photos
//!  │
//!  ├─ 1. Ingest    read each file, transcode HEIC/HEIF, wrap in a data URI
//!  ├─ 2. Paginate  greedy 15-per-page partition, input order preserved
//!  ├─ 3. Layout    compose each page into an A4 bitmap (grid, rotate, crop)
//!  ├─ 4. Document  append each bitmap as a full-bleed A4 PDF page
//!  └─ 5. Output    save `polaroid-a4-sheets.pdf` once, or hand to the spooler
//! ```
//!
//! Every stage is strictly sequential — one file, then one page at a time —
//! so peak memory stays at a single decoded photo or composed sheet.
//! Individual failures (an unreadable file, a photo that will not decode)
//! cost one slot or one cell, never the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polaroid_sheets::{generate_to_file, SheetConfig};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let photos: Vec<PathBuf> = std::fs::read_dir("vacation")?
//!         .filter_map(|e| e.ok().map(|e| e.path()))
//!         .collect();
//!
//!     let config = SheetConfig::default();
//!     let output = generate_to_file(&photos, "polaroid-a4-sheets.pdf", &config).await?;
//!     eprintln!(
//!         "{} page(s), {} photo(s), {} dropped",
//!         output.stats.written_pages,
//!         output.stats.ingested_files,
//!         output.stats.dropped_files,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `polaroid-sheets` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `heif`  | off     | Built-in HEIC/HEIF transcoding via the system libheif |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! polaroid-sheets = { version = "0.3", default-features = false }
//! ```
//!
//! Without `heif`, HEIC/HEIF files are dropped (with a warning and a count
//! in the stats) unless a custom
//! [`FormatConverter`](crate::pipeline::ingest::FormatConverter) is supplied.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod paginate;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SheetConfig, SheetConfigBuilder, DEFAULT_OUTPUT_NAME};
pub use error::{CellError, SheetError};
pub use generate::{export_document_with, generate, generate_sync, generate_to_file, print_sheets};
pub use output::{ExportOutput, ExportStats, PageRecord};
pub use paginate::{paginate, Page};
pub use pipeline::document::{DocumentSink, PdfSheetWriter};
pub use pipeline::ingest::{ConvertError, FormatConverter, IngestOutcome, Polaroid};
pub use pipeline::layout::{GridCompositor, Rasterizer, SheetGeometry};
pub use progress::{NoopProgressCallback, ProgressCallback, SheetProgressCallback};
