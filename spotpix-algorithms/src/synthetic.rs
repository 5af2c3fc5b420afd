//! Synthetic frames with Gaussian spots, for tests and benchmarks.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use spotpix_core::{Frame, Result};

/// A Gaussian hit to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSpot {
    /// Centre x.
    pub x: f64,
    /// Centre y.
    pub y: f64,
    /// Standard deviation in pixels.
    pub sigma: f64,
    /// Peak intensity.
    pub amplitude: f64,
}

impl GaussianSpot {
    /// Creates a spot.
    #[must_use]
    pub fn new(x: f64, y: f64, sigma: f64, amplitude: f64) -> Self {
        Self {
            x,
            y,
            sigma,
            amplitude,
        }
    }

    fn value_at(&self, px: f64, py: f64) -> f64 {
        let dx = px - self.x;
        let dy = py - self.y;
        self.amplitude * (-(dx * dx + dy * dy) / (2.0 * self.sigma * self.sigma)).exp()
    }
}

/// Owned frame buffer that spots are rendered into.
///
/// Rendering adds each spot's contribution, rounds to the nearest integer and
/// saturates at 255. Padding bytes past the visible width are left at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticFrame {
    data: Vec<u8>,
    width: usize,
    height: usize,
    pitch: usize,
}

impl SyntheticFrame {
    /// Creates a black frame without row padding.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_pitch(width, height, width)
    }

    /// Creates a black frame with `pitch` bytes per row.
    #[must_use]
    pub fn with_pitch(width: usize, height: usize, pitch: usize) -> Self {
        let pitch = pitch.max(width);
        Self {
            data: vec![0; pitch * height],
            width,
            height,
            pitch,
        }
    }

    /// Adds a constant to every visible pixel.
    #[must_use]
    pub fn with_background(mut self, level: u8) -> Self {
        for y in 0..self.height {
            for px in &mut self.data[y * self.pitch..y * self.pitch + self.width] {
                *px = px.saturating_add(level);
            }
        }
        self
    }

    /// Renders spots, each within 4 sigma of its centre.
    #[must_use]
    pub fn with_spots(mut self, spots: &[GaussianSpot]) -> Self {
        let mut acc = vec![0.0f64; self.width * self.height];
        for spot in spots {
            let reach = (4.0 * spot.sigma).ceil();
            let x0 = (spot.x - reach).floor().max(0.0) as usize;
            let y0 = (spot.y - reach).floor().max(0.0) as usize;
            let x1 = ((spot.x + reach).ceil().max(0.0) as usize).min(self.width.saturating_sub(1));
            let y1 = ((spot.y + reach).ceil().max(0.0) as usize).min(self.height.saturating_sub(1));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    acc[y * self.width + x] += spot.value_at(x as f64, y as f64);
                }
            }
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let px = &mut self.data[y * self.pitch + x];
                let value = f64::from(*px) + acc[y * self.width + x];
                *px = value.round().clamp(0.0, 255.0) as u8;
            }
        }
        self
    }

    /// Renders `count` spots on a regular grid with spacing `spacing`.
    #[must_use]
    pub fn with_spot_grid(self, count: usize, spacing: f64, sigma: f64, amplitude: f64) -> Self {
        let per_row = ((self.width as f64 - spacing) / spacing).floor().max(1.0) as usize;
        let spots: Vec<GaussianSpot> = (0..count)
            .map(|i| {
                let col = (i % per_row) as f64;
                let row = (i / per_row) as f64;
                // quarter-pixel offsets so centres are not pixel-aligned
                GaussianSpot::new(
                    spacing + col * spacing + 0.25,
                    spacing + row * spacing + 0.4,
                    sigma,
                    amplitude,
                )
            })
            .collect();
        self.with_spots(&spots)
    }

    /// Raw bytes including padding.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Visible width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrowed frame view.
    ///
    /// # Errors
    /// Only fails for zero-sized frames.
    pub fn frame(&self) -> Result<Frame<'_>> {
        Frame::new(&self.data, self.width, self.height, self.pitch)
    }
}
