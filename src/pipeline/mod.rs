//! Pipeline stages for photo-to-sheet generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different rasteriser or document backend)
//! without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ paginate ──▶ layout ──▶ document ──▶ print
//! (files →    (15 per      (A4 grid   (printpdf    (host
//!  data URIs)  page)        bitmap)    pages)       spooler)
//! ```
//!
//! 1. [`ingest`]   — read each file, transcode legacy HEIC/HEIF, wrap the
//!    bytes in a self-contained data URI; failures drop the file, never the
//!    batch
//! 2. `paginate` (in the crate root) — pure partitioning into fixed grids
//! 3. [`layout`]   — compose one A4 sheet bitmap per page; runs in
//!    `spawn_blocking` because compositing is CPU-bound
//! 4. [`document`] — append each sheet as a full-bleed A4 page and save once
//!    at the very end
//! 5. [`print`]    — hand the finished document to the host print spooler

pub mod document;
pub mod ingest;
pub mod layout;
pub mod print;
