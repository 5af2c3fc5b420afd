//! Sync-signal monitor.
//!
//! Two rectangles are sampled during the raster pass: one where the external
//! pulse indicator shows up and one of plain background. The pulse is
//! considered present when the signal average exceeds twice the baseline.

use spotpix_core::{SyncRegions, SyncStatus};

/// Ratio the signal average must exceed over the baseline average.
pub const SIGNAL_TO_BASELINE_RATIO: f64 = 2.0;

/// Intensity sums collected over the two sync rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncAccumulator {
    /// Summed intensity inside the signal region.
    pub signal_sum: u64,
    /// Pixels sampled inside the signal region.
    pub signal_count: u64,
    /// Summed intensity inside the baseline region.
    pub baseline_sum: u64,
    /// Pixels sampled inside the baseline region.
    pub baseline_count: u64,
}

impl SyncAccumulator {
    /// Clears all sums.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds a pixel to every region that contains it. The regions may overlap.
    #[inline]
    pub fn sample(&mut self, regions: &SyncRegions, x: usize, y: usize, value: u8) {
        if regions.signal.contains(x, y) {
            self.signal_sum += u64::from(value);
            self.signal_count += 1;
        }
        if regions.baseline.contains(x, y) {
            self.baseline_sum += u64::from(value);
            self.baseline_count += 1;
        }
    }

    /// Mean signal intensity, `None` when nothing was sampled.
    #[must_use]
    pub fn avg_signal(&self) -> Option<f64> {
        average(self.signal_sum, self.signal_count)
    }

    /// Mean baseline intensity, `None` when nothing was sampled.
    #[must_use]
    pub fn avg_baseline(&self) -> Option<f64> {
        average(self.baseline_sum, self.baseline_count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(sum: u64, count: u64) -> Option<f64> {
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Derives the sync status from accumulated sums.
///
/// An undefined average on either side means no decision can be made, so the
/// signal is reported absent.
#[must_use]
pub fn evaluate(sums: &SyncAccumulator) -> SyncStatus {
    let avg_signal = sums.avg_signal();
    let avg_baseline = sums.avg_baseline();
    let signal_present = match (avg_signal, avg_baseline) {
        (Some(signal), Some(baseline)) => signal > SIGNAL_TO_BASELINE_RATIO * baseline,
        _ => false,
    };
    SyncStatus {
        signal_present,
        avg_signal,
        avg_baseline,
    }
}
