//! Ingestion: read uploaded files into self-contained data URIs.
//!
//! ## Why data URIs?
//!
//! Each surviving photo becomes a `data:<mime>;base64,<bytes>` string — a
//! self-contained renderable representation with no filesystem tie. Once a
//! file is ingested its handle can disappear; pagination and layout only
//! ever see the URI. Decoding is deferred to export so a corrupt-but-
//! readable file costs its cell, not its slot.
//!
//! ## Failure policy
//!
//! Individual failures never stop the batch: an unreadable file, a blob no
//! decoder recognises, or a legacy HEIC/HEIF file with no transcoder is
//! logged and dropped — it contributes no slot to pagination. The dropped
//! count is surfaced in [`IngestOutcome`] so callers can tell the user how
//! many photos went missing.

use crate::config::SheetConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// A single displayable unit: one polaroid cell's image.
///
/// Immutable once created; consumed by the paginator and the layout stage.
#[derive(Debug, Clone)]
pub struct Polaroid {
    /// Self-contained `data:<mime>;base64,…` representation of the pixels.
    pub uri: String,
    /// Original file name, kept for logs only.
    pub name: String,
}

/// What ingestion produced for a batch of files.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Surviving images, in input order. Dropped files leave no slot.
    pub images: Vec<Polaroid>,
    /// Files attempted.
    pub attempted: usize,
    /// Files dropped (unreadable, undecodable, or untranscodable legacy).
    pub dropped: usize,
}

/// Transcoding failure from a [`FormatConverter`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConvertError(pub String);

/// Pluggable legacy-format transcoder: camera-native bytes in, bytes a
/// standard raster decoder understands out.
///
/// Ingestion treats the conversion as a black box; any implementation can
/// be swapped in via [`crate::config::SheetConfigBuilder::converter`]
/// without touching ingestion control flow.
pub trait FormatConverter: Send + Sync {
    /// Transcode `bytes` to JPEG at the given quality (0.1–1.0).
    fn convert(&self, bytes: &[u8], quality: f32) -> Result<Vec<u8>, ConvertError>;
}

/// Built-in HEIC/HEIF → JPEG transcoder backed by libheif.
#[cfg(feature = "heif")]
pub struct HeifJpegConverter;

#[cfg(feature = "heif")]
impl FormatConverter for HeifJpegConverter {
    fn convert(&self, bytes: &[u8], quality: f32) -> Result<Vec<u8>, ConvertError> {
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes)
            .map_err(|e| ConvertError(format!("HEIF container parse failed: {e}")))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| ConvertError(format!("No primary HEIF image: {e}")))?;
        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| ConvertError(format!("HEIF decode failed: {e}")))?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| ConvertError("HEIF decode produced no interleaved plane".into()))?;

        let (width, height) = (plane.width, plane.height);
        let stride = plane.stride;
        let mut rgb = image::RgbImage::new(width, height);
        for y in 0..height as usize {
            let row = &plane.data[y * stride..y * stride + width as usize * 3];
            for x in 0..width as usize {
                let p = image::Rgb([row[x * 3], row[x * 3 + 1], row[x * 3 + 2]]);
                rgb.put_pixel(x as u32, y as u32, p);
            }
        }

        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut out,
            (quality * 100.0).round().clamp(1.0, 100.0) as u8,
        );
        image::DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(encoder)
            .map_err(|e| ConvertError(format!("JPEG encode failed: {e}")))?;
        Ok(out)
    }
}

/// Case-insensitive suffix match for the two known legacy extensions.
pub fn is_legacy_format(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".heic") || lower.ends_with(".heif")
}

/// Read every file in order, producing one [`Polaroid`] per survivor.
///
/// Strictly sequential, one file at a time, bounding peak memory to one
/// raw blob in flight. Progress fires after every attempt.
pub async fn ingest_files(paths: &[std::path::PathBuf], config: &SheetConfig) -> IngestOutcome {
    let total = paths.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_start(total);
    }

    let mut images = Vec::with_capacity(total);
    let mut dropped = 0usize;

    for (i, path) in paths.iter().enumerate() {
        match ingest_one(path, config).await {
            Ok(polaroid) => {
                debug!("Ingested {} ({} bytes of URI)", polaroid.name, polaroid.uri.len());
                images.push(polaroid);
            }
            Err(reason) => {
                warn!("Dropping '{}': {}", path.display(), reason);
                dropped += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_dropped(i + 1, total, &reason);
                }
            }
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_done(i + 1, total);
        }
    }

    IngestOutcome {
        images,
        attempted: total,
        dropped,
    }
}

/// Ingest a single file. The error string is a human-readable drop reason.
async fn ingest_one(path: &Path, config: &SheetConfig) -> Result<Polaroid, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("read failed: {e}"))?;

    let (bytes, mime) = if is_legacy_format(&name) {
        let Some(converter) = config.converter.as_ref() else {
            return Err("legacy HEIC/HEIF file but no transcoder is configured \
                        (build with the `heif` feature or supply a converter)"
                .to_string());
        };
        let converter = std::sync::Arc::clone(converter);
        let quality = config.jpeg_quality;
        // Transcoding is CPU-bound; keep it off the async worker threads.
        let converted = tokio::task::spawn_blocking(move || converter.convert(&bytes, quality))
            .await
            .map_err(|e| format!("transcode task panicked: {e}"))?
            .map_err(|e| format!("transcode failed: {e}"))?;
        (converted, "image/jpeg")
    } else {
        let format = image::guess_format(&bytes).map_err(|e| format!("unrecognised image: {e}"))?;
        let mime = format.to_mime_type();
        (bytes, mime)
    };

    Ok(Polaroid {
        uri: format!("data:{mime};base64,{}", STANDARD.encode(&bytes)),
        name,
    })
}
