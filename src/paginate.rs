//! Pagination: partition ingested images into fixed-capacity A4 pages.
//!
//! A pure, deterministic pass: pages fill greedily in input order and close
//! exactly when they reach capacity or when input runs out. Every page is
//! full except possibly the last; zero images yield zero pages. Re-running
//! on the same input always yields the same pagination.

use crate::pipeline::ingest::Polaroid;

/// One A4 page worth of polaroid cells, at most `capacity` of them.
#[derive(Debug, Clone)]
pub struct Page {
    pub images: Vec<Polaroid>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Partition `images` into `ceil(N / capacity)` pages, order-preserving.
///
/// `capacity` must be ≥ 1; [`crate::config::SheetConfigBuilder::build`]
/// enforces this before the paginator ever runs.
pub fn paginate(images: Vec<Polaroid>, capacity: usize) -> Vec<Page> {
    debug_assert!(capacity >= 1);

    let mut pages = Vec::with_capacity(images.len().div_ceil(capacity.max(1)));
    let mut current: Vec<Polaroid> = Vec::new();

    for image in images {
        current.push(image);
        if current.len() == capacity {
            pages.push(Page {
                images: std::mem::take(&mut current),
            });
        }
    }

    // Trailing partial page.
    if !current.is_empty() {
        pages.push(Page { images: current });
    }

    pages
}
