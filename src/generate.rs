//! Top-level generation entry points.
//!
//! One linear pass: ingest files → paginate → compose and append each
//! sheet → save once at the very end. Everything is awaited sequentially —
//! one file, then one page at a time — which bounds peak memory to a single
//! decoded photo or composed sheet in flight. There is no cancellation
//! path: a run goes to completion or aborts on a fatal error.
//!
//! Compositing is synchronous: the bitmap is complete when `capture`
//! returns, so the export loop never waits on a paint to settle.

use crate::config::SheetConfig;
use crate::error::{CellError, SheetError};
use crate::output::{ExportOutput, ExportStats, PageRecord};
use crate::paginate::{paginate, Page};
use crate::pipeline::document::{DocumentSink, PdfSheetWriter};
use crate::pipeline::ingest::ingest_files;
use crate::pipeline::layout::{GridCompositor, Rasterizer, SheetGeometry};
use crate::pipeline::print::spool_document;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Generate A4 polaroid sheets from the given photo files.
///
/// This is the primary entry point for the library. The result holds the
/// assembled PDF bytes plus per-page records and run statistics; nothing is
/// written to disk (use [`generate_to_file`] for that).
///
/// # Errors
/// Returns `Err(SheetError)` only for fatal conditions:
/// - No image survived ingestion ([`SheetError::NoImages`])
/// - PDF assembly failed
///
/// Per-photo and per-page failures are recovered locally and recorded in
/// the output instead.
pub async fn generate(
    inputs: &[PathBuf],
    config: &SheetConfig,
) -> Result<ExportOutput, SheetError> {
    let total_start = Instant::now();
    info!("Starting sheet generation for {} file(s)", inputs.len());

    // ── Step 1: Ingest ───────────────────────────────────────────────────
    let ingest_start = Instant::now();
    let outcome = ingest_files(inputs, config).await;
    let ingest_duration_ms = ingest_start.elapsed().as_millis() as u64;
    info!(
        "Ingested {}/{} file(s) ({} dropped) in {}ms",
        outcome.images.len(),
        outcome.attempted,
        outcome.dropped,
        ingest_duration_ms
    );

    // ── Step 2: Paginate ─────────────────────────────────────────────────
    let pages = paginate(outcome.images.clone(), config.page_capacity);
    if pages.is_empty() {
        return Err(SheetError::NoImages {
            attempted: outcome.attempted,
            dropped: outcome.dropped,
        });
    }
    info!(
        "Paginated into {} page(s) of up to {}",
        pages.len(),
        config.page_capacity
    );

    // ── Step 3: Compose and assemble ─────────────────────────────────────
    let export_start = Instant::now();
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(GridCompositor::new(SheetGeometry::new(
        config.page_capacity,
        config.columns,
        config.scale,
    )));
    let sink = PdfSheetWriter::new(&config.title);
    let (pdf, records) = export_document_with(rasterizer, sink, &pages, config).await?;
    let export_duration_ms = export_start.elapsed().as_millis() as u64;

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let written = records.iter().filter(|r| !r.skipped).count();
    let skipped = records.len() - written;
    let failed_cells = records.iter().map(|r| r.cell_errors.len()).sum();

    let stats = ExportStats {
        attempted_files: outcome.attempted,
        ingested_files: outcome.images.len(),
        dropped_files: outcome.dropped,
        total_pages: pages.len(),
        written_pages: written,
        skipped_pages: skipped,
        failed_cells,
        ingest_duration_ms,
        export_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        output_bytes: pdf.len() as u64,
    };

    info!(
        "Generation complete: {}/{} page(s), {} bytes, {}ms total",
        written,
        pages.len(),
        stats.output_bytes,
        stats.total_duration_ms
    );

    Ok(ExportOutput {
        path: None,
        pages: records,
        stats,
        pdf,
    })
}

/// Generate sheets and write the PDF directly to a file.
///
/// Uses atomic write (temp file + rename) so a crash mid-write cannot leave
/// a partial document behind — the file appears exactly once, at the end.
pub async fn generate_to_file(
    inputs: &[PathBuf],
    output_path: impl AsRef<Path>,
    config: &SheetConfig,
) -> Result<ExportOutput, SheetError> {
    let mut output = generate(inputs, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SheetError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| SheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| SheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    output.path = Some(path.to_path_buf());
    Ok(output)
}

/// Generate sheets and hand them straight to the host print spooler.
///
/// No file is produced for the caller; the document exists only in a temp
/// spool location. Fails with [`SheetError::NoImages`] before any print
/// dialog when nothing survived ingestion.
pub async fn print_sheets(
    inputs: &[PathBuf],
    config: &SheetConfig,
) -> Result<ExportOutput, SheetError> {
    let output = generate(inputs, config).await?;
    spool_document(&output.pdf, &config.title).await?;
    Ok(output)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    inputs: &[PathBuf],
    config: &SheetConfig,
) -> Result<ExportOutput, SheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SheetError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(inputs, config))
}

// ── Export loop ──────────────────────────────────────────────────────────

/// Compose every page through `rasterizer` and append it to `sink`,
/// strictly one page at a time.
///
/// Public so alternate backends can be substituted; [`generate`] wires in
/// the defaults ([`GridCompositor`] + [`PdfSheetWriter`]).
///
/// A page whose sheet cannot be composed is skipped with a warning and a
/// record, never aborting the rest. A sink failure is fatal: if the
/// document itself cannot grow there is nothing useful to continue with.
pub async fn export_document_with<S: DocumentSink>(
    rasterizer: Arc<dyn Rasterizer>,
    mut sink: S,
    pages: &[Page],
    config: &SheetConfig,
) -> Result<(Vec<u8>, Vec<PageRecord>), SheetError> {
    let total = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(total);
    }

    let mut records = Vec::with_capacity(total);

    for (i, page) in pages.iter().enumerate() {
        let page_num = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        let (cells, cell_errors) = decode_page_cells(page, config).await;
        for e in &cell_errors {
            warn!("Page {page_num}: {e}");
        }

        // Compositing is CPU-bound; keep it off the async worker threads.
        let raster = Arc::clone(&rasterizer);
        let composed = tokio::task::spawn_blocking(move || raster.capture(&cells))
            .await
            .map_err(|e| SheetError::Internal(format!("compose task panicked: {e}")))
            .and_then(|r| r);

        match composed {
            Ok(sheet) => {
                sink.append_page(&sheet)?;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total, cell_errors.len());
                }
                records.push(PageRecord {
                    page_num,
                    cell_count: page.len(),
                    cell_errors,
                    skipped: false,
                    skip_reason: None,
                });
            }
            Err(e) => {
                warn!("Skipping page {page_num}: {e}");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_skipped(page_num, total, &e.to_string());
                }
                records.push(PageRecord {
                    page_num,
                    cell_count: page.len(),
                    cell_errors,
                    skipped: true,
                    skip_reason: Some(e.to_string()),
                });
            }
        }
    }

    let written = sink.page_count();
    let pdf = sink.finish()?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(total, written);
    }

    Ok((pdf, records))
}

/// Decode every image on a page, each under its own timeout.
///
/// Returns one slot per image, `None` where decoding failed, plus the
/// collected failures. A failure costs its cell only; the page goes on.
async fn decode_page_cells(
    page: &Page,
    config: &SheetConfig,
) -> (Vec<Option<DynamicImage>>, Vec<CellError>) {
    let mut cells = Vec::with_capacity(page.len());
    let mut errors = Vec::new();

    for (index, polaroid) in page.images.iter().enumerate() {
        match decode_cell(polaroid.uri.clone(), index, config.cell_timeout_secs).await {
            Ok(img) => cells.push(Some(img)),
            Err(e) => {
                errors.push(e);
                cells.push(None);
            }
        }
    }

    (cells, errors)
}

/// Decode one data URI into pixels, bounded by `timeout_secs`.
async fn decode_cell(
    uri: String,
    index: usize,
    timeout_secs: u64,
) -> Result<DynamicImage, CellError> {
    let decode = tokio::task::spawn_blocking(move || decode_data_uri(&uri));

    match tokio::time::timeout(Duration::from_secs(timeout_secs), decode).await {
        Err(_) => Err(CellError::Timeout {
            index,
            secs: timeout_secs,
        }),
        Ok(Err(join)) => Err(CellError::DecodeFailed {
            index,
            detail: format!("decode task panicked: {join}"),
        }),
        Ok(Ok(Err(detail))) => Err(CellError::DecodeFailed { index, detail }),
        Ok(Ok(Ok(img))) => Ok(img),
    }
}

/// Parse a `data:<mime>;base64,<payload>` URI and decode the pixels.
fn decode_data_uri(uri: &str) -> Result<DynamicImage, String> {
    let payload = uri
        .split_once("base64,")
        .map(|(_, p)| p)
        .ok_or_else(|| "not a base64 data URI".to_string())?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64: {e}"))?;
    image::load_from_memory(&bytes).map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_uri(w: u32, h: u32) -> String {
        let img = RgbaImage::from_pixel(w, h, Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&buf))
    }

    #[test]
    fn data_uri_round_trip() {
        let uri = png_data_uri(12, 8);
        let img = decode_data_uri(&uri).unwrap();
        assert_eq!((img.width(), img.height()), (12, 8));
    }

    #[test]
    fn malformed_uri_is_an_error() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
        assert!(decode_data_uri("plain string").is_err());
    }

    #[tokio::test]
    async fn decode_cell_reports_bad_payloads_per_index() {
        let err = decode_cell("data:image/png;base64,AAAA".into(), 7, 5)
            .await
            .unwrap_err();
        match err {
            CellError::DecodeFailed { index, .. } => assert_eq!(index, 7),
            other => panic!("expected DecodeFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn bad_cell_leaves_a_blank_slot_in_order() {
        let page = Page {
            images: vec![
                crate::pipeline::ingest::Polaroid {
                    uri: png_data_uri(4, 4),
                    name: "ok_a.png".into(),
                },
                crate::pipeline::ingest::Polaroid {
                    uri: "data:image/png;base64,corrupt".into(),
                    name: "broken.png".into(),
                },
                crate::pipeline::ingest::Polaroid {
                    uri: png_data_uri(6, 6),
                    name: "ok_b.png".into(),
                },
            ],
        };

        let config = SheetConfig::default();
        let (cells, errors) = decode_page_cells(&page, &config).await;

        assert_eq!(cells.len(), 3);
        assert!(cells[0].is_some());
        assert!(cells[1].is_none());
        assert!(cells[2].is_some());
        assert_eq!(errors.len(), 1);
    }
}
