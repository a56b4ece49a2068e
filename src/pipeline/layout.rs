//! Sheet layout: compose one A4 bitmap per page.
//!
//! A deterministic compositor: same inputs, same pixels, on every run and
//! every platform. Once `capture` returns, the page is fully painted; the
//! export loop never has to wait on a render surface.
//!
//! ## Geometry
//!
//! Physical A4 (210 × 297 mm) rasterised at `96 × scale` DPI. The page
//! carries 3 mm outer padding, cells sit in a `columns × ceil(capacity /
//! columns)` grid with 2 mm gaps, and each cell keeps a 2 mm white inner
//! frame — the polaroid border. A thin grey stroke marks the cell edge so
//! the frame survives printing on white paper.
//!
//! ## Cover semantics
//!
//! Each photo is rotated 90° first, then `resize_to_fill` scales it against
//! its own native aspect ratio and centre-crops to the cell interior —
//! the raster equivalent of `object-fit: cover` computed on true
//! proportions.

use crate::error::SheetError;
use image::imageops::FilterType;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

/// Physical page width, ISO A4 portrait.
pub const A4_WIDTH_MM: f32 = 210.0;
/// Physical page height, ISO A4 portrait.
pub const A4_HEIGHT_MM: f32 = 297.0;

const PAGE_PADDING_MM: f32 = 3.0;
const CELL_GAP_MM: f32 = 2.0;
const CELL_PADDING_MM: f32 = 2.0;

/// CSS reference density; `scale` multiplies this.
const BASE_DPI: f32 = 96.0;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME_GREY: Rgba<u8> = Rgba([214, 214, 214, 255]);

fn mm_to_px(mm: f32, dpi: f32) -> u32 {
    (mm / 25.4 * dpi).round() as u32
}

/// A cell's pixel rectangle on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resolved pixel geometry for one sheet.
#[derive(Debug, Clone)]
pub struct SheetGeometry {
    /// Raster density in dots per inch.
    pub dpi: f32,
    /// Full page width in pixels.
    pub width_px: u32,
    /// Full page height in pixels.
    pub height_px: u32,
    /// Cell rectangles in row-major order, exactly `capacity` of them.
    pub cells: Vec<CellRect>,
    /// Inner polaroid frame, in pixels, applied inside each cell.
    pub cell_padding_px: u32,
}

impl SheetGeometry {
    /// Compute the grid for `capacity` cells over `columns` columns at the
    /// given scale factor.
    pub fn new(capacity: usize, columns: usize, scale: u32) -> Self {
        let dpi = BASE_DPI * scale as f32;
        let width_px = mm_to_px(A4_WIDTH_MM, dpi);
        let height_px = mm_to_px(A4_HEIGHT_MM, dpi);
        let padding = mm_to_px(PAGE_PADDING_MM, dpi);
        let gap = mm_to_px(CELL_GAP_MM, dpi);

        let rows = capacity.div_ceil(columns);
        let cols = columns as u32;
        let rows_u = rows as u32;

        let content_w = width_px.saturating_sub(padding * 2);
        let content_h = height_px.saturating_sub(padding * 2);
        let cell_w = content_w.saturating_sub(gap * (cols - 1)) / cols;
        let cell_h = content_h.saturating_sub(gap * (rows_u - 1)) / rows_u;

        let mut cells = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let col = (i as u32) % cols;
            let row = (i as u32) / cols;
            cells.push(CellRect {
                x: padding + col * (cell_w + gap),
                y: padding + row * (cell_h + gap),
                width: cell_w,
                height: cell_h,
            });
        }

        Self {
            dpi,
            width_px,
            height_px,
            cells,
            cell_padding_px: mm_to_px(CELL_PADDING_MM, dpi),
        }
    }
}

/// Rasterises a page of decoded images into a sheet bitmap.
///
/// A narrow seam: the export loop only ever calls `capture`, so an
/// alternate rendering backend can be substituted wholesale.
pub trait Rasterizer: Send + Sync {
    /// Compose the page. `cells[i]` is `None` when image `i` failed to
    /// decode; its cell is left blank.
    fn capture(&self, cells: &[Option<DynamicImage>]) -> Result<RgbaImage, SheetError>;
}

/// The default rasteriser: white A4 canvas, grid placement, 90° rotation,
/// cover crop.
pub struct GridCompositor {
    geometry: SheetGeometry,
}

impl GridCompositor {
    pub fn new(geometry: SheetGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &SheetGeometry {
        &self.geometry
    }
}

impl Rasterizer for GridCompositor {
    fn capture(&self, cells: &[Option<DynamicImage>]) -> Result<RgbaImage, SheetError> {
        let geo = &self.geometry;
        // Opaque white background regardless of source transparency.
        let mut canvas = RgbaImage::from_pixel(geo.width_px, geo.height_px, WHITE);

        for (slot, cell) in cells.iter().zip(geo.cells.iter()) {
            stroke_rect(&mut canvas, cell, 1, FRAME_GREY);

            let Some(img) = slot else {
                continue;
            };

            let pad = geo.cell_padding_px;
            let inner_w = cell.width.saturating_sub(pad * 2);
            let inner_h = cell.height.saturating_sub(pad * 2);
            if inner_w == 0 || inner_h == 0 {
                continue;
            }

            // Rotate about the image's own centre, then cover-crop against
            // the rotated native aspect ratio.
            let fitted = img
                .rotate90()
                .resize_to_fill(inner_w, inner_h, FilterType::Lanczos3)
                .to_rgba8();
            debug!(
                "Placed {}×{} photo into {}×{} cell interior",
                img.width(),
                img.height(),
                inner_w,
                inner_h
            );

            imageops::overlay(
                &mut canvas,
                &fitted,
                (cell.x + pad) as i64,
                (cell.y + pad) as i64,
            );
        }

        Ok(canvas)
    }
}

/// Draw a `thickness`-pixel rectangle outline, clamped to the canvas.
fn stroke_rect(canvas: &mut RgbaImage, rect: &CellRect, thickness: u32, color: Rgba<u8>) {
    let (cw, ch) = (canvas.width(), canvas.height());
    for t in 0..thickness {
        let left = rect.x + t;
        let top = rect.y + t;
        let right = (rect.x + rect.width).saturating_sub(1 + t);
        let bottom = (rect.y + rect.height).saturating_sub(1 + t);
        for x in left..=right.min(cw.saturating_sub(1)) {
            if top < ch {
                canvas.put_pixel(x, top, color);
            }
            if bottom < ch {
                canvas.put_pixel(x, bottom, color);
            }
        }
        for y in top..=bottom.min(ch.saturating_sub(1)) {
            if left < cw {
                canvas.put_pixel(left, y, color);
            }
            if right < cw {
                canvas.put_pixel(right, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_at_scale_2_is_1587_by_2245() {
        let geo = SheetGeometry::new(15, 3, 2);
        assert_eq!(geo.width_px, 1587);
        assert_eq!(geo.height_px, 2245);
        assert!((geo.dpi - 192.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fifteen_cells_in_three_columns_make_five_rows() {
        let geo = SheetGeometry::new(15, 3, 2);
        assert_eq!(geo.cells.len(), 15);

        // Row-major: cells 0..3 share a y, cell 3 starts the next row.
        assert_eq!(geo.cells[0].y, geo.cells[1].y);
        assert_eq!(geo.cells[1].y, geo.cells[2].y);
        assert!(geo.cells[3].y > geo.cells[2].y);
        assert_eq!(geo.cells[3].x, geo.cells[0].x);

        let distinct_rows: std::collections::BTreeSet<u32> =
            geo.cells.iter().map(|c| c.y).collect();
        assert_eq!(distinct_rows.len(), 5);
    }

    #[test]
    fn cells_stay_inside_the_page() {
        for scale in 1..=4 {
            let geo = SheetGeometry::new(15, 3, scale);
            for cell in &geo.cells {
                assert!(cell.x + cell.width <= geo.width_px);
                assert!(cell.y + cell.height <= geo.height_px);
            }
        }
    }

    #[test]
    fn compose_forces_an_opaque_white_background() {
        let geo = SheetGeometry::new(15, 3, 1);
        let compositor = GridCompositor::new(geo);
        let sheet = compositor.capture(&[]).unwrap();

        // Page corners sit in the padding band and must be pure white.
        let w = sheet.width() - 1;
        let h = sheet.height() - 1;
        for (x, y) in [(0, 0), (w, 0), (0, h), (w, h)] {
            assert_eq!(sheet.get_pixel(x, y), &WHITE);
        }
    }

    #[test]
    fn photo_lands_inside_its_cell_interior() {
        let geo = SheetGeometry::new(15, 3, 1);
        let cell = geo.cells[0];
        let pad = geo.cell_padding_px;
        let compositor = GridCompositor::new(geo);

        // A solid red landscape photo: rotation and cover-crop keep it red.
        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            120,
            80,
            Rgba([255, 0, 0, 255]),
        ));
        let sheet = compositor.capture(&[Some(photo)]).unwrap();

        let cx = cell.x + cell.width / 2;
        let cy = cell.y + cell.height / 2;
        assert_eq!(sheet.get_pixel(cx, cy), &Rgba([255, 0, 0, 255]));

        // Outside the first cell's column, same row: still blank white.
        let far_x = cell.x + cell.width + 4;
        assert_eq!(sheet.get_pixel(far_x, cy), &WHITE);
    }

    #[test]
    fn failed_cell_is_left_blank() {
        let geo = SheetGeometry::new(15, 3, 1);
        let cell = geo.cells[1];
        let compositor = GridCompositor::new(geo);

        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            40,
            40,
            Rgba([0, 0, 255, 255]),
        ));
        // Slot 1 failed to decode; slot 0 carries a photo.
        let sheet = compositor.capture(&[Some(photo), None]).unwrap();

        let cx = cell.x + cell.width / 2;
        let cy = cell.y + cell.height / 2;
        assert_eq!(sheet.get_pixel(cx, cy), &WHITE);
    }

    #[test]
    fn capture_is_deterministic() {
        let compositor = GridCompositor::new(SheetGeometry::new(15, 3, 1));
        let photo = || {
            Some(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                33,
                77,
                Rgba([10, 200, 30, 255]),
            )))
        };
        let a = compositor.capture(&[photo(), None, photo()]).unwrap();
        let b = compositor.capture(&[photo(), None, photo()]).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
