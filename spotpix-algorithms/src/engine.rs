//! Per-frame pipeline: label, resolve, extract, check sync.

use std::time::Instant;

use log::trace;
use rayon::prelude::*;
use spotpix_core::{
    CentroidConfig, Error, Frame, FrameDiagnostics, FrameResult, Result, SpotList,
};

use crate::display::DisplayBuffer;
use crate::equivalence::{EquivalenceResolver, ResolvedRegion};
use crate::extraction::SpotExtractor;
use crate::labeling::{LabelState, RegionLabeler};
use crate::sync;

/// Centroiding engine for frames of a fixed size.
///
/// The engine owns every working buffer and reuses them from frame to frame,
/// so `process` does not allocate beyond the returned spot lists. It runs one
/// frame per call on the calling thread. Frame skipping, backlog catch-up and
/// any other pacing against the camera are left to the caller, which can use
/// [`FrameResult::computation_time`] to decide.
#[derive(Debug, Clone)]
pub struct CentroidEngine {
    config: CentroidConfig,
    width: usize,
    height: usize,
    labeler: RegionLabeler,
    resolver: EquivalenceResolver,
    extractor: SpotExtractor,
    state: LabelState,
    regions: Vec<ResolvedRegion>,
}

impl CentroidEngine {
    /// Validates `config` against the frame size and allocates the buffers.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is unusable for this
    /// frame size.
    pub fn new(width: usize, height: usize, config: CentroidConfig) -> Result<Self> {
        config.validate(width, height)?;
        let labeler = RegionLabeler::new(&config, width, height);
        Ok(Self {
            resolver: EquivalenceResolver::new(labeler.aoi()),
            extractor: SpotExtractor::new(&config, width, height),
            state: LabelState::new(width, height, config.region_capacity),
            regions: Vec::with_capacity(config.region_capacity),
            labeler,
            config,
            width,
            height,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CentroidConfig {
        &self.config
    }

    /// Frame width the engine was built for.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height the engine was built for.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Swaps in a new configuration. The old one stays active on error.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `config` is invalid for this frame size.
    pub fn reconfigure(&mut self, config: CentroidConfig) -> Result<()> {
        config.validate(self.width, self.height)?;
        if config.region_capacity != self.config.region_capacity {
            self.state = LabelState::new(self.width, self.height, config.region_capacity);
        }
        self.labeler = RegionLabeler::new(&config, self.width, self.height);
        self.resolver = EquivalenceResolver::new(self.labeler.aoi());
        self.extractor = SpotExtractor::new(&config, self.width, self.height);
        self.config = config;
        Ok(())
    }

    /// Processes one frame.
    ///
    /// # Errors
    /// Returns [`Error::FrameMismatch`] if the frame size differs from the
    /// engine's.
    pub fn process(&mut self, frame: &Frame<'_>) -> Result<FrameResult> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::FrameMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        let start = Instant::now();

        self.labeler.label(frame, &mut self.state);
        self.resolver.resolve(&mut self.state, &mut self.regions);

        let mut result = FrameResult {
            com_spots: SpotList::with_capacity(self.config.spot_capacity),
            hybrid_spots: SpotList::with_capacity(self.config.spot_capacity),
            sync: sync::evaluate(self.state.sync()),
            diagnostics: FrameDiagnostics {
                regions_allocated: self.state.table().len(),
                regions_resolved: self.regions.len(),
                region_table_exhausted: self.state.table().is_exhausted(),
                unassigned_pixels: self.state.unassigned_pixels(),
                ..FrameDiagnostics::default()
            },
            ..FrameResult::default()
        };
        self.extractor.extract(&self.state, &self.regions, &mut result);
        result.computation_time = start.elapsed();

        trace!(
            "frame: {} regions, {} CoM / {} hybrid spots in {:?}",
            result.diagnostics.regions_resolved,
            result.com_spots.len(),
            result.hybrid_spots.len(),
            result.computation_time
        );
        Ok(result)
    }

    /// Processes one frame and refreshes `display` from it.
    ///
    /// # Errors
    /// Same as [`process`](Self::process); also fails if `display` has a
    /// different size than the frame.
    pub fn process_with_display(
        &mut self,
        frame: &Frame<'_>,
        display: &mut DisplayBuffer,
    ) -> Result<FrameResult> {
        let result = self.process(frame)?;
        display.refresh(frame)?;
        Ok(result)
    }

    /// Working image of the last processed frame; the border is zero.
    #[must_use]
    pub fn working_image(&self) -> &[u8] {
        self.state.image()
    }
}

/// Processes independent frames in parallel, one engine per rayon worker.
///
/// Results are returned in input order.
///
/// # Errors
/// Fails on an invalid configuration or on the first mismatched frame.
pub fn process_frames(
    width: usize,
    height: usize,
    config: &CentroidConfig,
    frames: &[Frame<'_>],
) -> Result<Vec<FrameResult>> {
    let engine = CentroidEngine::new(width, height, config.clone())?;
    frames
        .par_iter()
        .map_init(|| engine.clone(), |engine, frame| engine.process(frame))
        .collect()
}
