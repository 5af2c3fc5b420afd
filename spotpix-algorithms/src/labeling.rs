//! Single-pass region labeling.
//!
//! One raster scan over the frame interior (a 1-pixel border is skipped so the
//! left and upper neighbours always exist). The pass:
//! - copies every interior pixel into the working image,
//! - feeds every interior pixel to the sync accumulator,
//! - labels lit pixels inside the area of interest with 4-connectivity,
//!   merging regions through the [`RegionTable`] as they meet.

use log::debug;
use spotpix_core::{CentroidConfig, Frame, Rect, SyncRegions};

use crate::regions::RegionTable;
use crate::sync::SyncAccumulator;

/// Per-frame working buffers, reused across frames.
#[derive(Debug, Clone)]
pub struct LabelState {
    width: usize,
    height: usize,
    image: Vec<u8>,
    labels: Vec<u32>,
    table: RegionTable,
    sync: SyncAccumulator,
    unassigned_pixels: u64,
}

impl LabelState {
    /// Allocates buffers for `width` x `height` frames.
    #[must_use]
    pub fn new(width: usize, height: usize, region_capacity: usize) -> Self {
        Self {
            width,
            height,
            image: vec![0; width * height],
            labels: vec![0; width * height],
            table: RegionTable::with_capacity(region_capacity),
            sync: SyncAccumulator::default(),
            unassigned_pixels: 0,
        }
    }

    /// Clears everything left over from the previous frame.
    pub fn reset(&mut self) {
        self.image.fill(0);
        self.labels.fill(0);
        self.table.reset();
        self.sync.reset();
        self.unassigned_pixels = 0;
    }

    /// Frame width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Working copy of the frame; border pixels are zero.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Per-pixel region ids, row-major without padding.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Working-image intensity at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.image[y * self.width + x]
    }

    /// Region id at `(x, y)`; 0 means unassigned.
    #[inline]
    #[must_use]
    pub fn label(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    /// The region table.
    #[must_use]
    pub fn table(&self) -> &RegionTable {
        &self.table
    }

    /// Sync sums collected during the pass.
    #[must_use]
    pub fn sync(&self) -> &SyncAccumulator {
        &self.sync
    }

    /// Lit pixels that could not get a region because the table was full.
    #[must_use]
    pub fn unassigned_pixels(&self) -> u64 {
        self.unassigned_pixels
    }

    pub(crate) fn table_and_labels_mut(&mut self) -> (&mut RegionTable, &mut [u32]) {
        (&mut self.table, &mut self.labels)
    }
}

/// Raster-pass labeler.
#[derive(Debug, Clone)]
pub struct RegionLabeler {
    threshold: u8,
    aoi: Rect,
    sync: SyncRegions,
}

impl RegionLabeler {
    /// Creates a labeler for frames of the given size.
    #[must_use]
    pub fn new(config: &CentroidConfig, width: usize, height: usize) -> Self {
        Self {
            threshold: config.threshold,
            aoi: config.effective_aoi(width, height),
            sync: config.sync,
        }
    }

    /// The area of interest being labeled.
    #[must_use]
    pub fn aoi(&self) -> Rect {
        self.aoi
    }

    /// Runs the raster pass over `frame`, resetting `state` first.
    ///
    /// `state` must have been created for the frame's dimensions.
    pub fn label(&self, frame: &Frame<'_>, state: &mut LabelState) {
        debug_assert_eq!((frame.width(), frame.height()), (state.width, state.height));
        state.reset();

        let width = state.width;
        for y in 1..state.height - 1 {
            let row = frame.row(y);
            for x in 1..width - 1 {
                let value = row[x];
                let idx = y * width + x;
                state.image[idx] = value;
                state.sync.sample(&self.sync, x, y, value);

                if value < self.threshold || !self.aoi.contains(x, y) {
                    continue;
                }

                let left = state.labels[idx - 1];
                let above = state.labels[idx - width];
                let region = match (left, above) {
                    (0, 0) => state.table.allocate(),
                    (id, 0) | (0, id) => Some(state.table.find(id)),
                    (a, b) => Some(state.table.union(a, b)),
                };

                match region {
                    Some(id) => {
                        state.labels[idx] = id;
                        state.table.accumulate(id, x, y, value);
                    }
                    None => state.unassigned_pixels += 1,
                }
            }
        }

        if state.table.is_exhausted() {
            debug!(
                "region table full ({} ids), {} lit pixels left unassigned",
                state.table.capacity(),
                state.unassigned_pixels
            );
        }
    }
}
