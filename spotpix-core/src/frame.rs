//! Borrowed view of one raw camera frame.

use crate::error::{Error, Result};

/// One 8-bit intensity frame, addressed with a row pitch.
///
/// The pitch may exceed the width when the camera pads rows. The frame only
/// borrows the buffer: the caller keeps ownership and must not mutate it while
/// a frame is being processed.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    pitch: usize,
}

impl<'a> Frame<'a> {
    /// Wraps a byte buffer as a frame.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFrame`] if the geometry is empty, the pitch is
    /// narrower than the width, or the buffer is too short.
    pub fn new(data: &'a [u8], width: usize, height: usize, pitch: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidFrame(format!(
                "empty geometry {width}x{height}"
            )));
        }
        if pitch < width {
            return Err(Error::InvalidFrame(format!(
                "pitch {pitch} is narrower than width {width}"
            )));
        }
        let required = pitch * (height - 1) + width;
        if data.len() < required {
            return Err(Error::InvalidFrame(format!(
                "buffer holds {} bytes, {width}x{height} with pitch {pitch} needs {required}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            pitch,
        })
    }

    /// Wraps a tightly packed buffer (pitch equal to width).
    ///
    /// # Errors
    /// See [`Frame::new`].
    pub fn packed(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, height, width)
    }

    /// Frame width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row in the underlying buffer.
    #[inline]
    #[must_use]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Intensity at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the pixel lies outside the frame.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.pitch + x]
    }

    /// The visible pixels of row `y`, without pitch padding.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.pitch;
        &self.data[start..start + self.width]
    }

    /// Minimum and maximum intensity over the visible pixels.
    #[must_use]
    pub fn intensity_range(&self) -> (u8, u8) {
        (0..self.height)
            .flat_map(|y| self.row(y).iter().copied())
            .fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}
