//! Centroiding configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Rect;

/// Upper bound on each per-frame table capacity.
///
/// Tables are allocated up front on every engine, so this keeps a bad
/// configuration from turning into an allocation failure mid-run.
pub const MAX_CAPACITY: usize = 1 << 22;

/// The two rectangles sampled to detect an external sync pulse.
///
/// `signal` covers the spot where the pulse indicator lights up, `baseline`
/// covers plain background for comparison. An empty rectangle leaves its
/// average undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncRegions {
    /// Region lit by the sync indicator.
    pub signal: Rect,
    /// Background-only region.
    pub baseline: Rect,
}

/// Configuration for frame centroiding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CentroidConfig {
    /// Minimum intensity for a pixel to be lit.
    pub threshold: u8,
    /// Regions with fewer pixels are discarded as noise.
    pub min_pixels: u32,
    /// Regions with more pixels are decomposed with the hybrid gradient method.
    pub max_pixels: u32,
    /// Side length of the square hybrid search window.
    pub window_size: u32,
    /// Hybrid candidates closer than this on both axes are merged.
    pub merge_radius: f64,
    /// Area of interest; `None` centroids the whole frame.
    pub aoi: Option<Rect>,
    /// Sync-signal sampling regions.
    pub sync: SyncRegions,
    /// Whether oversized regions are decomposed at all.
    pub use_hybrid: bool,
    /// Number of region ids available per frame.
    pub region_capacity: usize,
    /// Maximum spots kept per list per frame.
    pub spot_capacity: usize,
    /// Maximum hybrid candidates kept per region.
    pub candidate_capacity: usize,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            min_pixels: 3,
            max_pixels: 120,
            window_size: 40,
            merge_radius: 1.5,
            aoi: None,
            sync: SyncRegions::default(),
            use_hybrid: true,
            region_capacity: 1500,
            spot_capacity: 2500,
            candidate_capacity: 100,
        }
    }
}

impl CentroidConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lit-pixel threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the minimum region size.
    #[must_use]
    pub fn with_min_pixels(mut self, min_pixels: u32) -> Self {
        self.min_pixels = min_pixels;
        self
    }

    /// Sets the largest region still handled by center of mass.
    #[must_use]
    pub fn with_max_pixels(mut self, max_pixels: u32) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Sets the hybrid search window size.
    #[must_use]
    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the duplicate-merge radius.
    #[must_use]
    pub fn with_merge_radius(mut self, radius: f64) -> Self {
        self.merge_radius = radius;
        self
    }

    /// Restricts centroiding to an area of interest.
    #[must_use]
    pub fn with_aoi(mut self, aoi: Rect) -> Self {
        self.aoi = Some(aoi);
        self
    }

    /// Sets the sync-signal region.
    #[must_use]
    pub fn with_signal_region(mut self, rect: Rect) -> Self {
        self.sync.signal = rect;
        self
    }

    /// Sets the sync baseline region.
    #[must_use]
    pub fn with_baseline_region(mut self, rect: Rect) -> Self {
        self.sync.baseline = rect;
        self
    }

    /// Enables or disables hybrid decomposition.
    #[must_use]
    pub fn with_hybrid(mut self, enabled: bool) -> Self {
        self.use_hybrid = enabled;
        self
    }

    /// Sets the region table capacity.
    #[must_use]
    pub fn with_region_capacity(mut self, capacity: usize) -> Self {
        self.region_capacity = capacity;
        self
    }

    /// Sets the per-list spot capacity.
    #[must_use]
    pub fn with_spot_capacity(mut self, capacity: usize) -> Self {
        self.spot_capacity = capacity;
        self
    }

    /// Sets the per-region hybrid candidate capacity.
    #[must_use]
    pub fn with_candidate_capacity(mut self, capacity: usize) -> Self {
        self.candidate_capacity = capacity;
        self
    }

    /// The area of interest resolved against the frame size.
    #[must_use]
    pub fn effective_aoi(&self, width: usize, height: usize) -> Rect {
        self.aoi.unwrap_or_else(|| Rect::full(width, height))
    }

    /// Validates the configuration for frames of `width` x `height`.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self, width: usize, height: usize) -> Result<(), ConfigError> {
        if width < 3 || height < 3 {
            return Err(ConfigError::FrameTooSmall { width, height });
        }
        if self.threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.min_pixels == 0 || self.max_pixels < self.min_pixels {
            return Err(ConfigError::InvalidPixelBounds {
                min_pixels: self.min_pixels,
                max_pixels: self.max_pixels,
            });
        }
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if !self.merge_radius.is_finite() || self.merge_radius < 0.0 {
            return Err(ConfigError::InvalidMergeRadius(self.merge_radius));
        }
        for (name, capacity) in [
            ("region table", self.region_capacity),
            ("spot list", self.spot_capacity),
            ("hybrid candidate list", self.candidate_capacity),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
            if capacity > MAX_CAPACITY {
                return Err(ConfigError::CapacityTooLarge {
                    name,
                    capacity,
                    limit: MAX_CAPACITY,
                });
            }
        }
        if let Some(aoi) = self.aoi {
            aoi.validate("area of interest", width, height)?;
        }
        self.sync.signal.validate("signal region", width, height)?;
        self.sync.baseline.validate("baseline region", width, height)?;
        Ok(())
    }
}
