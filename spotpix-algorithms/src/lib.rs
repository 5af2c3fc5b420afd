//! spotpix-algorithms: Single-pass centroiding for electron-counting frames.
//!
//! The per-frame pipeline:
//! - **Labeling** - one raster pass, 4-connectivity, union-find equivalences
//! - **Resolution** - fold equivalent regions into canonical roots
//! - **Extraction** - center-of-mass for isolated hits, hybrid gradient
//!   decomposition for pileups
//! - **Sync check** - signal vs. baseline rectangle averages
//!
//! Around it sit multi-frame helpers: accumulated images, exposure tallies,
//! rolling spot statistics and a display overlay.
//!
#![warn(missing_docs)]

mod accumulation;
mod display;
mod engine;
mod equivalence;
mod extraction;
mod labeling;
pub mod regions;
mod rolling;
pub mod sync;
pub mod synthetic;

pub use accumulation::{AccumulatedImage, ExposureTally, SyncSplitImage};
pub use display::{DisplayBuffer, ALPHA_MULTIPLIER};
pub use engine::{process_frames, CentroidEngine};
pub use equivalence::{EquivalenceResolver, ResolvedRegion};
pub use extraction::SpotExtractor;
pub use labeling::{LabelState, RegionLabeler};
pub use regions::{Moments, RegionTable};
pub use rolling::{
    CountStats, RollingSpotAverages, RollingSummary, WindowStats, DEFAULT_REPORT_INTERVAL,
    SYNC_WINDOW, TOTAL_WINDOW,
};
pub use sync::SyncAccumulator;

// Re-export the core types callers need alongside the engine
pub use spotpix_core::{CentroidConfig, Frame, FrameResult, Rect, Spot, SpotMethod};
