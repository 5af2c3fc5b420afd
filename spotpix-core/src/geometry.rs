//! Rectangular regions on the detector.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Half-open pixel rectangle: `x_lower <= x < x_upper`, `y_lower <= y < y_upper`.
///
/// Used for the area of interest and for the two sync-signal regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x_lower: u32,
    /// Right edge (exclusive).
    pub x_upper: u32,
    /// Top edge (inclusive).
    pub y_lower: u32,
    /// Bottom edge (exclusive).
    pub y_upper: u32,
}

impl Rect {
    /// Creates a rectangle from its four bounds.
    #[inline]
    #[must_use]
    pub fn new(x_lower: u32, x_upper: u32, y_lower: u32, y_upper: u32) -> Self {
        Self {
            x_lower,
            x_upper,
            y_lower,
            y_upper,
        }
    }

    /// Creates a rectangle from a top-left corner and a size.
    ///
    /// Far edges saturate at `u32::MAX`, so an out-of-range rectangle still
    /// fails [`Rect::validate`] instead of wrapping around.
    #[inline]
    #[must_use]
    pub fn from_origin_size(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self::new(left, left.saturating_add(width), top, top.saturating_add(height))
    }

    /// Rectangle covering a whole `width` x `height` frame.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, width as u32, 0, height as u32)
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x_upper.saturating_sub(self.x_lower)
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y_upper.saturating_sub(self.y_lower)
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// True when the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Checks whether the pixel `(x, y)` lies inside.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (lx, ux) = (self.x_lower as usize, self.x_upper as usize);
        let (ly, uy) = (self.y_lower as usize, self.y_upper as usize);
        lx <= x && x < ux && ly <= y && y < uy
    }

    /// Validates that the rectangle is well-formed and fits in the frame.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvertedRegion`] or [`ConfigError::RegionOutOfBounds`].
    pub fn validate(&self, name: &'static str, width: usize, height: usize) -> Result<(), ConfigError> {
        if self.x_lower > self.x_upper || self.y_lower > self.y_upper {
            return Err(ConfigError::InvertedRegion { name });
        }
        if self.x_upper as usize > width || self.y_upper as usize > height {
            return Err(ConfigError::RegionOutOfBounds {
                name,
                x_lower: self.x_lower,
                x_upper: self.x_upper,
                y_lower: self.y_lower,
                y_upper: self.y_upper,
                width,
                height,
            });
        }
        Ok(())
    }
}
