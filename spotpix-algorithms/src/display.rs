//! RGBA overlay for live display.

use spotpix_core::{Error, Frame, Result};

/// Alpha drops by this much per intensity step.
pub const ALPHA_MULTIPLIER: u32 = 5;

/// RGBA buffer whose alpha channel tracks frame intensity.
///
/// Bright pixels become transparent, so the buffer works as a dark mask laid
/// over whatever the colour channels were filled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl DisplayBuffer {
    /// Creates an opaque black buffer.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let mut rgba = vec![0; width * height * 4];
        for pixel in rgba.chunks_exact_mut(4) {
            pixel[3] = u8::MAX;
        }
        Self { width, height, rgba }
    }

    /// Buffer width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Mutable RGBA bytes, for filling the colour channels.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.rgba
    }

    /// Alpha value at `(x, y)`.
    #[must_use]
    pub fn alpha(&self, x: usize, y: usize) -> u8 {
        self.rgba[(y * self.width + x) * 4 + 3]
    }

    /// Rewrites the alpha of every interior pixel from `frame`.
    ///
    /// # Errors
    /// Returns [`Error::FrameMismatch`] if the frame size differs from the
    /// buffer's.
    pub fn refresh(&mut self, frame: &Frame<'_>) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::FrameMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        if self.width < 3 || self.height < 3 {
            return Ok(());
        }

        for y in 1..self.height - 1 {
            let row = frame.row(y);
            let out = &mut self.rgba[y * self.width * 4..(y + 1) * self.width * 4];
            for x in 1..self.width - 1 {
                out[x * 4 + 3] = alpha_for(row[x]);
            }
        }
        Ok(())
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
fn alpha_for(intensity: u8) -> u8 {
    255u32.saturating_sub(ALPHA_MULTIPLIER * u32::from(intensity)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_mapping() {
        assert_eq!(alpha_for(0), 255);
        assert_eq!(alpha_for(10), 205);
        assert_eq!(alpha_for(51), 0);
        assert_eq!(alpha_for(200), 0);
    }

    #[test]
    fn test_refresh_touches_interior_alpha_only() {
        let data = [40u8; 16];
        let frame = Frame::packed(&data, 4, 4).unwrap();
        let mut display = DisplayBuffer::new(4, 4);
        display.as_bytes_mut()[(4 + 1) * 4] = 77;

        display.refresh(&frame).unwrap();

        assert_eq!(display.alpha(1, 1), 55);
        assert_eq!(display.alpha(2, 2), 55);
        assert_eq!(display.alpha(0, 0), 255);
        assert_eq!(display.alpha(3, 2), 255);
        // colour channel of (1, 1) kept
        assert_eq!(display.as_bytes()[(4 + 1) * 4], 77);
    }

    #[test]
    fn test_refresh_rejects_other_sizes() {
        let data = [0u8; 20];
        let frame = Frame::packed(&data, 5, 4).unwrap();
        let mut display = DisplayBuffer::new(4, 4);
        assert!(matches!(
            display.refresh(&frame),
            Err(Error::FrameMismatch { actual_width: 5, .. })
        ));
    }
}
