//! spotpix-core: Core types for frame centroiding.
//!
//! This crate provides the data model shared by the spotpix crates:
//! frame views, detector rectangles, configuration, spots, fixed-capacity
//! lists, and the per-frame result.
//!

pub mod bounded;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod result;
pub mod spot;

pub use bounded::BoundedList;
pub use config::{CentroidConfig, SyncRegions, MAX_CAPACITY};
pub use error::{ConfigError, Error, Result};
pub use frame::Frame;
pub use geometry::Rect;
pub use result::{FrameDiagnostics, FrameResult, SyncStatus};
pub use spot::{Spot, SpotList, SpotMethod};
