//! Per-frame output handed to the transport/presentation layer.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::spot::SpotList;

/// Outcome of the sync-signal check for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStatus {
    /// True when the signal region is more than twice as bright as the baseline.
    pub signal_present: bool,
    /// Mean intensity of the signal region, `None` if it covers no pixels.
    pub avg_signal: Option<f64>,
    /// Mean intensity of the baseline region, `None` if it covers no pixels.
    pub avg_baseline: Option<f64>,
}

/// Degradation counters for one frame.
///
/// None of these conditions abort processing; they are reported so callers
/// can tell when a frame's output was truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameDiagnostics {
    /// Region ids handed out during the scan.
    pub regions_allocated: usize,
    /// Connected components left after equivalence resolution.
    pub regions_resolved: usize,
    /// Components discarded for having fewer than `min_pixels` pixels.
    pub noise_regions: usize,
    /// Components larger than `max_pixels`.
    pub pileup_regions: usize,
    /// Set when the region table ran out of ids.
    pub region_table_exhausted: bool,
    /// Lit pixels left unlabeled because the table was full.
    pub unassigned_pixels: u64,
    /// Hybrid candidates dropped because a candidate list was full.
    pub candidates_dropped: usize,
}

/// Everything extracted from one frame.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameResult {
    /// Center-of-mass spots of regions within the size bounds.
    pub com_spots: SpotList,
    /// The CoM spots plus spots decomposed from oversized regions.
    pub hybrid_spots: SpotList,
    /// Whether the hybrid pass ran.
    pub hybrid_enabled: bool,
    /// Wall-clock time spent in the pipeline.
    pub computation_time: Duration,
    /// Sync-signal check.
    pub sync: SyncStatus,
    /// Degradation counters.
    pub diagnostics: FrameDiagnostics,
}

impl FrameResult {
    /// The list that holds every detected hit: the hybrid list when the hybrid
    /// pass ran, the CoM list otherwise.
    #[must_use]
    pub fn electrons(&self) -> &SpotList {
        if self.hybrid_enabled {
            &self.hybrid_spots
        } else {
            &self.com_spots
        }
    }

    /// Number of spots that came from pileup decomposition.
    #[must_use]
    pub fn decomposed_count(&self) -> usize {
        if self.hybrid_enabled {
            self.hybrid_spots.len().saturating_sub(self.com_spots.len())
        } else {
            0
        }
    }

    /// True if any list or table overflowed in this frame.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.region_table_exhausted
            || self.diagnostics.candidates_dropped > 0
            || self.com_spots.is_truncated()
            || self.hybrid_spots.is_truncated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spot::{Spot, SpotMethod};

    fn result_with(com: usize, hybrid_extra: usize, hybrid_enabled: bool) -> FrameResult {
        let mut result = FrameResult {
            com_spots: SpotList::with_capacity(16),
            hybrid_spots: SpotList::with_capacity(16),
            hybrid_enabled,
            ..Default::default()
        };
        for i in 0..com {
            let spot = Spot::new(i as f64, 0.0, 50.0, SpotMethod::CenterOfMass);
            result.com_spots.push(spot);
            if hybrid_enabled {
                result.hybrid_spots.push(spot);
            }
        }
        for i in 0..hybrid_extra {
            result
                .hybrid_spots
                .push(Spot::new(i as f64, 9.0, 50.0, SpotMethod::HybridGradient));
        }
        result
    }

    #[test]
    fn test_electrons_follow_hybrid_flag() {
        let result = result_with(3, 2, true);
        assert_eq!(result.electrons().len(), 5);
        assert_eq!(result.decomposed_count(), 2);

        let result = result_with(3, 0, false);
        assert_eq!(result.electrons().len(), 3);
        assert_eq!(result.decomposed_count(), 0);
    }

    #[test]
    fn test_degraded_flag() {
        let mut result = result_with(1, 0, true);
        assert!(!result.is_degraded());
        result.diagnostics.region_table_exhausted = true;
        assert!(result.is_degraded());
    }
}
