//! Document assembly: append sheet bitmaps as full-bleed A4 PDF pages.
//!
//! ## Why raw RGB, not JPEG?
//!
//! Each sheet is embedded losslessly (raw RGB samples, no DCT filter).
//! JPEG artefacts on a 192 DPI sheet are visible on paper; the one-time
//! size cost is acceptable for a file that exists to be printed once.
//!
//! ## Full-bleed placement
//!
//! printpdf places images by DPI, which only approximates the page after
//! pixel rounding. The per-axis scale correction below makes each bitmap
//! span exactly 210 × 297 mm, edge to edge, regardless of raster rounding.

use crate::error::SheetError;
use crate::pipeline::layout::{A4_HEIGHT_MM, A4_WIDTH_MM};
use image::RgbaImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfPageIndex, Px,
};
use std::io::BufWriter;
use tracing::debug;

/// Receives sheet bitmaps one at a time and produces the final document.
///
/// The export loop only ever calls `append_page` then `finish`, so an
/// alternate document backend can be substituted wholesale.
pub trait DocumentSink {
    /// Append one sheet as the next full-bleed A4 page.
    fn append_page(&mut self, sheet: &RgbaImage) -> Result<(), SheetError>;

    /// Number of pages appended so far.
    fn page_count(&self) -> usize;

    /// Finalise and return the serialised document. Called exactly once,
    /// after all pages; nothing is persisted before this point.
    fn finish(self) -> Result<Vec<u8>, SheetError>
    where
        Self: Sized;
}

/// The default sink: a portrait-A4 multi-page PDF built with printpdf.
pub struct PdfSheetWriter {
    doc: PdfDocumentReference,
    // The first page exists from construction; it is consumed by the first
    // append instead of adding a fresh one.
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
    pages_written: usize,
}

impl PdfSheetWriter {
    pub fn new(title: &str) -> Self {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Photos");
        Self {
            doc,
            first_page: Some((page1, layer1)),
            pages_written: 0,
        }
    }
}

impl DocumentSink for PdfSheetWriter {
    fn append_page(&mut self, sheet: &RgbaImage) -> Result<(), SheetError> {
        let (width, height) = sheet.dimensions();
        if width == 0 || height == 0 {
            return Err(SheetError::PdfAssembly {
                detail: "empty sheet bitmap".to_string(),
            });
        }

        // New blank page boundary before every page except the first.
        let (page, layer) = match self.first_page.take() {
            Some(first) => first,
            None => self
                .doc
                .add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Photos"),
        };
        let layer_ref = self.doc.get_page(page).get_layer(layer);

        // The canvas is opaque by construction; strip the alpha channel.
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for px in sheet.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
        }

        let xobject = ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb,
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        };

        // Exact full bleed: at `dpi` the bitmap spans width/dpi*25.4 mm;
        // correct each axis so it lands on 210 × 297 exactly.
        let dpi = 192.0_f32;
        let natural_w_mm = width as f32 / dpi * 25.4;
        let natural_h_mm = height as f32 / dpi * 25.4;
        let transform = ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            scale_x: Some(A4_WIDTH_MM / natural_w_mm),
            scale_y: Some(A4_HEIGHT_MM / natural_h_mm),
            dpi: Some(dpi),
            ..Default::default()
        };

        Image::from(xobject).add_to_layer(layer_ref, transform);
        self.pages_written += 1;
        debug!(
            "Appended page {} ({}×{} px)",
            self.pages_written, width, height
        );
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages_written
    }

    /// If no page was ever appended, the document still carries the single
    /// blank page created at construction; `page_count` stays 0.
    fn finish(self) -> Result<Vec<u8>, SheetError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(|e| SheetError::PdfAssembly {
            detail: e.to_string(),
        })?;
        buf.into_inner().map_err(|e| SheetError::PdfAssembly {
            detail: e.to_string(),
        })
    }
}
