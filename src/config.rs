//! Configuration types for sheet generation.
//!
//! All layout and export behaviour is controlled through [`SheetConfig`],
//! built via its [`SheetConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share configs across calls, log them, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::SheetError;
use crate::pipeline::ingest::FormatConverter;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default output file name, matching the artifact contract exactly.
pub const DEFAULT_OUTPUT_NAME: &str = "polaroid-a4-sheets.pdf";

/// Configuration for one generation run.
///
/// Built via [`SheetConfig::builder()`] or using [`SheetConfig::default()`].
///
/// # Example
/// ```rust
/// use polaroid_sheets::SheetConfig;
///
/// let config = SheetConfig::builder()
///     .page_capacity(15)
///     .scale(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SheetConfig {
    /// Photos per A4 page. Default: 15 (a 3 × 5 grid).
    ///
    /// Pagination fills pages greedily in input order; every page is full
    /// except possibly the last.
    pub page_capacity: usize,

    /// Grid columns per page. Default: 3. Rows follow as
    /// `ceil(page_capacity / columns)`.
    pub columns: usize,

    /// Raster pixel density multiplier over the 96 DPI CSS baseline.
    /// Range: 1–4. Default: 2 (192 DPI).
    ///
    /// 2× is the print-quality sweet spot: a full A4 sheet composes to
    /// 1587 × 2245 px, sharp enough for photo printing while one in-flight
    /// sheet stays around 14 MB of RGBA. 3–4× quadruples memory for gains
    /// a home printer cannot reproduce.
    pub scale: u32,

    /// JPEG quality used when transcoding legacy (HEIC/HEIF) input.
    /// Range: 0.1–1.0. Default: 0.9.
    pub jpeg_quality: f32,

    /// Per-image decode budget in seconds during export. Default: 5.
    ///
    /// A single pathological file (decompression bomb, truncated stream
    /// that stalls a decoder) must not hang the whole export. On timeout
    /// the cell is left blank and the sheet continues.
    pub cell_timeout_secs: u64,

    /// PDF document title. Default: "Polaroid A4 Sheets".
    pub title: String,

    /// Output path for `generate_to_file`. Default: `polaroid-a4-sheets.pdf`
    /// in the current directory.
    pub output_path: PathBuf,

    /// Legacy-format transcoder. Default: the built-in HEIF backend when the
    /// `heif` feature is enabled, otherwise `None` (legacy files are dropped
    /// with a warning).
    ///
    /// Swappable without touching ingestion control flow: any
    /// `convert(bytes) -> renderable bytes | failure` capability fits.
    pub converter: Option<Arc<dyn FormatConverter>>,

    /// Progress callback receiving per-file and per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            page_capacity: 15,
            columns: 3,
            scale: 2,
            jpeg_quality: 0.9,
            cell_timeout_secs: 5,
            title: "Polaroid A4 Sheets".to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_NAME),
            converter: default_converter(),
            progress_callback: None,
        }
    }
}

#[cfg(feature = "heif")]
fn default_converter() -> Option<Arc<dyn FormatConverter>> {
    Some(Arc::new(crate::pipeline::ingest::HeifJpegConverter))
}

#[cfg(not(feature = "heif"))]
fn default_converter() -> Option<Arc<dyn FormatConverter>> {
    None
}

impl fmt::Debug for SheetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetConfig")
            .field("page_capacity", &self.page_capacity)
            .field("columns", &self.columns)
            .field("scale", &self.scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("cell_timeout_secs", &self.cell_timeout_secs)
            .field("title", &self.title)
            .field("output_path", &self.output_path)
            .field(
                "converter",
                &self.converter.as_ref().map(|_| "<dyn FormatConverter>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SheetProgressCallback>"),
            )
            .finish()
    }
}

impl SheetConfig {
    /// Create a new builder for `SheetConfig`.
    pub fn builder() -> SheetConfigBuilder {
        SheetConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SheetConfig`].
#[derive(Debug)]
pub struct SheetConfigBuilder {
    config: SheetConfig,
}

impl SheetConfigBuilder {
    pub fn page_capacity(mut self, n: usize) -> Self {
        self.config.page_capacity = n.max(1);
        // A shrinking capacity drags columns down with it so clamped
        // setters always leave a buildable config.
        self.config.columns = self.config.columns.min(self.config.page_capacity);
        self
    }

    pub fn columns(mut self, n: usize) -> Self {
        self.config.columns = n.clamp(1, 6);
        self
    }

    pub fn scale(mut self, s: u32) -> Self {
        self.config.scale = s.clamp(1, 4);
        self
    }

    pub fn jpeg_quality(mut self, q: f32) -> Self {
        self.config.jpeg_quality = q.clamp(0.1, 1.0);
        self
    }

    pub fn cell_timeout_secs(mut self, secs: u64) -> Self {
        self.config.cell_timeout_secs = secs.max(1);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn converter(mut self, converter: Arc<dyn FormatConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    /// Remove the transcoder entirely; legacy files are then always dropped.
    pub fn no_converter(mut self) -> Self {
        self.config.converter = None;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SheetConfig, SheetError> {
        let c = &self.config;
        if c.page_capacity == 0 {
            return Err(SheetError::InvalidConfig(
                "Page capacity must be ≥ 1".into(),
            ));
        }
        if c.columns == 0 || c.columns > c.page_capacity {
            return Err(SheetError::InvalidConfig(format!(
                "Columns must be 1–{} for a capacity of {}, got {}",
                c.page_capacity, c.page_capacity, c.columns
            )));
        }
        if !(1..=4).contains(&c.scale) {
            return Err(SheetError::InvalidConfig(format!(
                "Scale must be 1–4, got {}",
                c.scale
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_a4_contract() {
        let c = SheetConfig::default();
        assert_eq!(c.page_capacity, 15);
        assert_eq!(c.columns, 3);
        assert_eq!(c.scale, 2);
        assert_eq!(c.cell_timeout_secs, 5);
        assert!((c.jpeg_quality - 0.9).abs() < f32::EPSILON);
        assert_eq!(c.output_path, PathBuf::from(DEFAULT_OUTPUT_NAME));
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = SheetConfig::builder()
            .page_capacity(0)
            .scale(99)
            .jpeg_quality(7.0)
            .cell_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.page_capacity, 1);
        assert_eq!(c.columns, 1, "columns must follow a shrinking capacity");
        assert_eq!(c.scale, 4);
        assert!((c.jpeg_quality - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.cell_timeout_secs, 1);
    }

    #[test]
    fn shrinking_capacity_keeps_the_config_buildable() {
        // Default columns is 3; a capacity of 1 would otherwise conflict.
        let c = SheetConfig::builder().page_capacity(1).build().unwrap();
        assert_eq!(c.page_capacity, 1);
        assert_eq!(c.columns, 1);
    }

    #[test]
    fn build_rejects_more_columns_than_capacity() {
        let err = SheetConfig::builder()
            .page_capacity(2)
            .columns(5)
            .build()
            .unwrap_err();
        assert!(matches!(err, SheetError::InvalidConfig(_)));
    }
}
