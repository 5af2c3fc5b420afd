//! spotpix-io: File I/O for spotpix.
//!
//! This crate provides memory-mapped reading of raw frame files via
//! memmap2, spot and image writers, and JSON configuration loading.
//!

mod config;
mod error;
mod reader;
mod writer;

pub use config::{CameraGeometry, SpotpixConfig};
pub use error::{Error, Result};
pub use reader::{MappedFileReader, RawFrameFile};
pub use writer::{write_accumulated_image, write_rows, FrameSummary, OutputFormat, ResultWriter};
