//! Memory-mapped file readers.
//!

use crate::{Error, Result};
use log::debug;
use memmap2::Mmap;
use spotpix_core::Frame;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A file of back-to-back 8-bit frames, each `pitch * height` bytes.
pub struct RawFrameFile {
    reader: MappedFileReader,
    width: usize,
    height: usize,
    pitch: usize,
}

impl RawFrameFile {
    /// Opens a raw frame file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped, the geometry is
    /// unusable, or the file size is not a whole number of frames.
    pub fn open<P: AsRef<Path>>(path: P, width: usize, height: usize, pitch: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidFormat(format!(
                "frame size {width}x{height} is empty"
            )));
        }
        if pitch < width {
            return Err(Error::InvalidFormat(format!(
                "pitch {pitch} is smaller than width {width}"
            )));
        }

        let reader = MappedFileReader::open(path)?;
        let frame_len = pitch * height;
        if reader.len() % frame_len != 0 {
            return Err(Error::InvalidFormat(format!(
                "file size {} is not a multiple of the frame size {frame_len}",
                reader.len()
            )));
        }

        debug!(
            "opened {}: {} frames of {width}x{height} (pitch {pitch})",
            reader.path().display(),
            reader.len() / frame_len
        );
        Ok(Self {
            reader,
            width,
            height,
            pitch,
        })
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Bytes per frame.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.pitch * self.height
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Number of frames in the file.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.reader.len() / self.frame_len()
    }

    /// Borrows frame `index`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if `index` is past the last frame.
    pub fn frame(&self, index: usize) -> Result<Frame<'_>> {
        if index >= self.frame_count() {
            return Err(Error::InvalidFormat(format!(
                "frame {index} requested, file has {}",
                self.frame_count()
            )));
        }
        let start = index * self.frame_len();
        let bytes = &self.reader.as_bytes()[start..start + self.frame_len()];
        Ok(Frame::new(bytes, self.width, self.height, self.pitch)?)
    }

    /// Iterates over all frames in file order.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame<'_>>> + '_ {
        (0..self.frame_count()).map(move |index| self.frame(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_mapped_file_reader() {
        let file = temp_file(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), 8);
        assert!(!reader.is_empty());
        assert_eq!(reader.as_bytes()[7], 8);
    }

    #[test]
    fn test_raw_frames_with_pitch() {
        // two 3x2 frames with a pitch of 4
        let bytes: Vec<u8> = (0..16).collect();
        let file = temp_file(&bytes);
        let frames = RawFrameFile::open(file.path(), 3, 2, 4).unwrap();

        assert_eq!(frames.frame_count(), 2);
        let second = frames.frame(1).unwrap();
        assert_eq!(second.get(0, 0), 8);
        assert_eq!(second.row(1), &[12, 13, 14]);
        assert!(frames.frame(2).is_err());
        assert_eq!(frames.frames().count(), 2);
    }

    #[test]
    fn test_partial_frame_rejected() {
        let file = temp_file(&[0; 13]);
        let result = RawFrameFile::open(file.path(), 3, 2, 3);
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_empty_file_has_no_frames() {
        let file = NamedTempFile::new().unwrap();
        let frames = RawFrameFile::open(file.path(), 4, 4, 4).unwrap();
        assert_eq!(frames.frame_count(), 0);
    }

    #[test]
    fn test_bad_geometry_rejected() {
        let file = temp_file(&[0; 16]);
        assert!(RawFrameFile::open(file.path(), 4, 4, 2).is_err());
        assert!(RawFrameFile::open(file.path(), 0, 4, 4).is_err());
    }
}
