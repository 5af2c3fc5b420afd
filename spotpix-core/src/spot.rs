//! Spot (single particle hit) types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounded::BoundedList;

/// How a spot position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpotMethod {
    /// Intensity-weighted centre of an isolated region.
    CenterOfMass,
    /// Gradient zero-crossing inside an oversized (pileup) region.
    HybridGradient,
}

impl SpotMethod {
    /// Short lowercase label used in output files.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CenterOfMass => "com",
            Self::HybridGradient => "hybrid",
        }
    }

    /// Numeric code used in binary output.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::CenterOfMass => 0,
            Self::HybridGradient => 1,
        }
    }
}

/// One detected hit at sub-pixel precision.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spot {
    /// X coordinate in frame pixels.
    pub x: f64,
    /// Y coordinate in frame pixels.
    pub y: f64,
    /// Mean pixel intensity of the region the spot came from.
    pub intensity: f64,
    /// Extraction method.
    pub method: SpotMethod,
}

impl Spot {
    /// Creates a spot.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, intensity: f64, method: SpotMethod) -> Self {
        Self {
            x,
            y,
            intensity,
            method,
        }
    }

    /// Euclidean distance to a point.
    #[inline]
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Per-frame spot list with fixed capacity.
pub type SpotList = BoundedList<Spot>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spot_distance() {
        let spot = Spot::new(3.0, 4.0, 100.0, SpotMethod::CenterOfMass);
        assert_relative_eq!(spot.distance_to(0.0, 0.0), 5.0);
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(SpotMethod::CenterOfMass.label(), "com");
        assert_eq!(SpotMethod::HybridGradient.code(), 1);
    }
}
