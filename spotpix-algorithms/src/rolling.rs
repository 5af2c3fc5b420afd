//! Rolling spot-count statistics over recent frames.
#![allow(clippy::cast_precision_loss)]

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use spotpix_core::FrameResult;

/// Frames kept per sync state.
pub const SYNC_WINDOW: usize = 10;
/// Frames kept regardless of sync state.
pub const TOTAL_WINDOW: usize = 20;
/// Default number of frames between summaries.
pub const DEFAULT_REPORT_INTERVAL: usize = 10;

/// Mean and population standard deviation of one count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowStats {
    /// Mean over the window; 0 if the window is empty.
    pub mean: f64,
    /// Population standard deviation; 0 if the window is empty.
    pub stdev: f64,
}

impl WindowStats {
    fn from_samples<I: ExactSizeIterator<Item = f64>>(samples: I) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::default();
        }
        let (sum, sum_sq) = samples.fold((0.0, 0.0), |(s, s2), v| (s + v, s2 + v * v));
        let mean = sum / n as f64;
        let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
        Self {
            mean,
            stdev: variance.sqrt(),
        }
    }
}

/// Statistics of the three per-frame counts over one window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountStats {
    /// Center-of-mass spots.
    pub com: WindowStats,
    /// Spots found only by pileup decomposition.
    pub hybrid: WindowStats,
    /// Both together.
    pub total: WindowStats,
}

/// Snapshot emitted every report interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollingSummary {
    /// Frames with the sync signal present.
    pub on: CountStats,
    /// Frames without the sync signal.
    pub off: CountStats,
    /// All recent frames.
    pub total: CountStats,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    com: f64,
    hybrid: f64,
    total: f64,
}

#[derive(Debug, Clone)]
struct Window {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn stats(&self) -> CountStats {
        CountStats {
            com: WindowStats::from_samples(self.samples.iter().map(|s| s.com)),
            hybrid: WindowStats::from_samples(self.samples.iter().map(|s| s.hybrid)),
            total: WindowStats::from_samples(self.samples.iter().map(|s| s.total)),
        }
    }
}

/// Rolling spot counts split by sync state.
#[derive(Debug, Clone)]
pub struct RollingSpotAverages {
    on: Window,
    off: Window,
    total: Window,
    report_interval: usize,
    since_report: usize,
}

impl Default for RollingSpotAverages {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}

impl RollingSpotAverages {
    /// Creates empty windows that report every `report_interval` frames.
    #[must_use]
    pub fn new(report_interval: usize) -> Self {
        Self {
            on: Window::new(SYNC_WINDOW),
            off: Window::new(SYNC_WINDOW),
            total: Window::new(TOTAL_WINDOW),
            report_interval: report_interval.max(1),
            since_report: 0,
        }
    }

    /// Adds a frame; returns a summary when a report is due.
    pub fn update(&mut self, result: &FrameResult) -> Option<RollingSummary> {
        let com = result.com_spots.len();
        let hybrid = result.decomposed_count();
        let sample = Sample {
            com: com as f64,
            hybrid: hybrid as f64,
            total: (com + hybrid) as f64,
        };

        if result.sync.signal_present {
            self.on.push(sample);
        } else {
            self.off.push(sample);
        }
        self.total.push(sample);

        self.since_report += 1;
        if self.since_report < self.report_interval {
            return None;
        }
        self.since_report = 0;
        Some(self.summary())
    }

    /// Current statistics, regardless of the report schedule.
    #[must_use]
    pub fn summary(&self) -> RollingSummary {
        RollingSummary {
            on: self.on.stats(),
            off: self.off.stats(),
            total: self.total.stats(),
        }
    }
}
