//! Multi-frame accumulation of spots into binned images and tallies.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use spotpix_core::{FrameResult, Rect, Spot};

/// Square histogram of spot positions over an area of interest.
///
/// A spot at `x` lands in column `round((x - aoi.x_lower) * bins / aoi.width)`;
/// rows work the same way. Spots that round outside the grid are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedImage {
    bins: usize,
    aoi: Rect,
    counts: Vec<u32>,
}

impl AccumulatedImage {
    /// Creates an empty `bins` x `bins` image spanning `aoi`.
    #[must_use]
    pub fn new(bins: usize, aoi: Rect) -> Self {
        Self {
            bins,
            aoi,
            counts: vec![0; bins * bins],
        }
    }

    /// Bins per side.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Clears all counts.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Bin of a position, or `None` if it falls outside the grid.
    #[must_use]
    pub fn bin_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = bin_index(x, self.aoi.x_lower, self.aoi.width(), self.bins)?;
        let row = bin_index(y, self.aoi.y_lower, self.aoi.height(), self.bins)?;
        Some((col, row))
    }

    /// Adds one spot. Returns false if it fell outside the grid.
    pub fn add_spot(&mut self, spot: &Spot) -> bool {
        match self.bin_of(spot.x, spot.y) {
            Some((col, row)) => {
                self.counts[row * self.bins + col] += 1;
                true
            }
            None => false,
        }
    }

    /// Adds every spot and returns how many were binned.
    pub fn add_spots<'a, I>(&mut self, spots: I) -> usize
    where
        I: IntoIterator<Item = &'a Spot>,
    {
        spots.into_iter().filter(|spot| self.add_spot(spot)).count()
    }

    /// Count in bin `(col, row)`.
    #[must_use]
    pub fn count(&self, col: usize, row: usize) -> u32 {
        self.counts[row * self.bins + col]
    }

    /// All counts, row-major.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Rows of counts, top to bottom.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u32> {
        self.counts.chunks_exact(self.bins.max(1))
    }
}

#[allow(clippy::cast_precision_loss)]
fn bin_index(value: f64, lower: u32, extent: u32, bins: usize) -> Option<usize> {
    if extent == 0 || bins == 0 {
        return None;
    }
    let scaled = ((value - f64::from(lower)) * bins as f64 / f64::from(extent)).round();
    if scaled < 0.0 || scaled >= bins as f64 {
        return None;
    }
    Some(scaled as usize)
}

/// Accumulated images split by the sync signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSplitImage {
    on: AccumulatedImage,
    off: AccumulatedImage,
    difference: Vec<i64>,
}

impl SyncSplitImage {
    /// Creates empty images of `bins` x `bins` over `aoi`.
    #[must_use]
    pub fn new(bins: usize, aoi: Rect) -> Self {
        Self {
            on: AccumulatedImage::new(bins, aoi),
            off: AccumulatedImage::new(bins, aoi),
            difference: vec![0; bins * bins],
        }
    }

    /// Adds a frame's electrons to the on or off image.
    ///
    /// Returns how many spots were binned.
    pub fn add_frame(&mut self, result: &FrameResult) -> usize {
        let signal_present = result.sync.signal_present;
        let (image, delta) = if signal_present {
            (&mut self.on, 1)
        } else {
            (&mut self.off, -1)
        };

        let mut added = 0;
        for spot in result.electrons() {
            if let Some((col, row)) = image.bin_of(spot.x, spot.y) {
                image.counts[row * image.bins + col] += 1;
                self.difference[row * image.bins + col] += delta;
                added += 1;
            }
        }
        added
    }

    /// Image of frames with the signal present.
    #[must_use]
    pub fn on(&self) -> &AccumulatedImage {
        &self.on
    }

    /// Image of frames without the signal.
    #[must_use]
    pub fn off(&self) -> &AccumulatedImage {
        &self.off
    }

    /// On minus off, row-major.
    #[must_use]
    pub fn difference(&self) -> &[i64] {
        &self.difference
    }

    /// Clears all three images.
    pub fn reset(&mut self) {
        self.on.reset();
        self.off.reset();
        self.difference.fill(0);
    }
}

/// Electron and frame counts split by sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExposureTally {
    /// Electrons seen in frames with the signal present.
    pub electrons_on: u64,
    /// Electrons seen in frames without the signal.
    pub electrons_off: u64,
    /// Frames with the signal present.
    pub frames_on: u64,
    /// Frames without the signal.
    pub frames_off: u64,
}

impl ExposureTally {
    /// Counts one frame.
    pub fn record(&mut self, result: &FrameResult) {
        let electrons = result.electrons().len() as u64;
        if result.sync.signal_present {
            self.electrons_on += electrons;
            self.frames_on += 1;
        } else {
            self.electrons_off += electrons;
            self.frames_off += 1;
        }
    }

    /// All electrons.
    #[must_use]
    pub fn electrons_total(&self) -> u64 {
        self.electrons_on + self.electrons_off
    }

    /// All frames.
    #[must_use]
    pub fn frames_total(&self) -> u64 {
        self.frames_on + self.frames_off
    }

    /// Clears all counts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotpix_core::{SpotList, SpotMethod, SyncStatus};

    fn spot(x: f64, y: f64) -> Spot {
        Spot::new(x, y, 50.0, SpotMethod::CenterOfMass)
    }

    fn frame_result(spots: &[Spot], signal_present: bool) -> FrameResult {
        let mut com_spots = SpotList::with_capacity(16);
        for s in spots {
            com_spots.push(*s);
        }
        FrameResult {
            com_spots,
            sync: SyncStatus {
                signal_present,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_binning_is_relative_to_aoi() {
        // 100 px wide AoI starting at 50, 10 bins of 10 px
        let aoi = Rect::new(50, 150, 20, 120);
        let mut image = AccumulatedImage::new(10, aoi);

        assert_eq!(image.bin_of(50.0, 20.0), Some((0, 0)));
        assert_eq!(image.bin_of(84.0, 20.0), Some((3, 0)));
        assert_eq!(image.bin_of(86.0, 76.0), Some((4, 6)));
        // rounds up to bin 10, past the last one
        assert_eq!(image.bin_of(146.0, 20.0), None);
        assert_eq!(image.bin_of(10.0, 20.0), None);

        let spots = [spot(84.0, 20.0), spot(84.4, 21.0), spot(149.0, 20.0)];
        assert_eq!(image.add_spots(&spots), 2);
        assert_eq!(image.count(3, 0), 2);
        assert_eq!(image.total(), 2);

        image.reset();
        assert_eq!(image.total(), 0);
    }

    #[test]
    fn test_rows() {
        let mut image = AccumulatedImage::new(3, Rect::new(0, 3, 0, 3));
        image.add_spot(&spot(1.0, 2.0));
        let rows: Vec<&[u32]> = image.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], &[0, 1, 0]);
    }

    #[test]
    fn test_sync_split() {
        let mut split = SyncSplitImage::new(4, Rect::new(0, 4, 0, 4));
        assert_eq!(split.add_frame(&frame_result(&[spot(1.0, 1.0), spot(2.0, 1.0)], true)), 2);
        assert_eq!(split.add_frame(&frame_result(&[spot(1.0, 1.0)], false)), 1);

        assert_eq!(split.on().total(), 2);
        assert_eq!(split.off().total(), 1);
        assert_eq!(split.difference()[4 + 1], 0);
        assert_eq!(split.difference()[4 + 2], 1);
    }

    #[test]
    fn test_exposure_tally_uses_electrons() {
        let mut tally = ExposureTally::default();
        let mut with_hybrid = frame_result(&[spot(1.0, 1.0)], true);
        with_hybrid.hybrid_enabled = true;
        with_hybrid.hybrid_spots = SpotList::with_capacity(8);
        for s in [spot(1.0, 1.0), spot(5.0, 5.0), spot(6.0, 5.0)] {
            with_hybrid.hybrid_spots.push(s);
        }
        tally.record(&with_hybrid);
        tally.record(&frame_result(&[spot(1.0, 1.0), spot(2.0, 2.0)], false));

        assert_eq!(tally.electrons_on, 3);
        assert_eq!(tally.electrons_off, 2);
        assert_eq!(tally.electrons_total(), 5);
        assert_eq!(tally.frames_on, 1);
        assert_eq!(tally.frames_total(), 2);
    }
}
