//! Error types for spotpix-core.

use thiserror::Error;

/// Result type alias for spotpix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for spotpix operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected before any frame was processed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Frame buffer does not match its declared geometry.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Frame dimensions differ from the ones the engine was configured for.
    #[error("frame is {actual_width}x{actual_height}, engine expects {expected_width}x{expected_height}")]
    FrameMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}

/// Configuration validation errors.
///
/// All of these are raised once at configuration time; frame processing
/// never produces them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Frames need at least one interior pixel.
    #[error("frame {width}x{height} is too small, need at least 3x3")]
    FrameTooSmall { width: usize, height: usize },

    /// A rectangle extends past the frame edge.
    #[error("{name} [{x_lower}, {x_upper}) x [{y_lower}, {y_upper}) exceeds frame {width}x{height}")]
    RegionOutOfBounds {
        name: &'static str,
        x_lower: u32,
        x_upper: u32,
        y_lower: u32,
        y_upper: u32,
        width: usize,
        height: usize,
    },

    /// A rectangle has a lower bound above its upper bound.
    #[error("{name} has inverted bounds")]
    InvertedRegion { name: &'static str },

    /// A zero threshold would label every pixel, including zero-intensity ones.
    #[error("intensity threshold must be at least 1")]
    ZeroThreshold,

    /// Pixel-count bounds are unusable.
    #[error("pixel bounds invalid: min_pixels={min_pixels}, max_pixels={max_pixels}")]
    InvalidPixelBounds { min_pixels: u32, max_pixels: u32 },

    /// Hybrid search window must cover at least one pixel.
    #[error("hybrid window size must be positive")]
    ZeroWindow,

    /// Merge radius must be finite and non-negative.
    #[error("merge radius {0} is not a finite non-negative number")]
    InvalidMergeRadius(f64),

    /// A fixed-capacity table was configured with no room.
    #[error("{0} capacity must be positive")]
    ZeroCapacity(&'static str),

    /// A fixed-capacity table was configured larger than can be allocated.
    #[error("{name} capacity {capacity} exceeds the limit of {limit}")]
    CapacityTooLarge {
        name: &'static str,
        capacity: usize,
        limit: usize,
    },
}
