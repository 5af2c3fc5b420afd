//! Spot extraction from resolved regions.
//!
//! Regions are classified by pixel count:
//! 1. Fewer than `min_pixels`: noise, dropped.
//! 2. Up to `max_pixels`: one center-of-mass spot (an isolated hit).
//! 3. More than `max_pixels`: a pileup of several hits. No CoM spot is
//!    emitted; the hybrid gradient method looks for local intensity maxima in
//!    a window around the region's centre and emits one spot per maximum.
//!
//! The hybrid list carries every CoM spot plus the decomposed spots, in
//! region order, so the two lists can be compared downstream.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use log::debug;
use spotpix_core::{BoundedList, CentroidConfig, FrameResult, Rect, Spot, SpotMethod};

use crate::equivalence::ResolvedRegion;
use crate::labeling::LabelState;

/// A gradient zero-crossing found inside a pileup region.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x: f64,
    y: f64,
    /// Pixel intensity used as merge weight; accumulates as candidates merge.
    weight: f64,
    absorbed: bool,
}

/// Center-of-mass and hybrid gradient spot extraction.
#[derive(Debug, Clone)]
pub struct SpotExtractor {
    min_pixels: u32,
    max_pixels: u32,
    window_size: u32,
    merge_radius: f64,
    use_hybrid: bool,
    aoi: Rect,
    candidates: BoundedList<Candidate>,
}

impl SpotExtractor {
    /// Creates an extractor for frames of the given size.
    #[must_use]
    pub fn new(config: &CentroidConfig, width: usize, height: usize) -> Self {
        Self {
            min_pixels: config.min_pixels,
            max_pixels: config.max_pixels,
            window_size: config.window_size,
            merge_radius: config.merge_radius,
            use_hybrid: config.use_hybrid,
            aoi: config.effective_aoi(width, height),
            candidates: BoundedList::with_capacity(config.candidate_capacity),
        }
    }

    /// Classifies `regions` and appends their spots to `result`.
    ///
    /// `state` must be the resolved label state the regions came from.
    pub fn extract(&mut self, state: &LabelState, regions: &[ResolvedRegion], result: &mut FrameResult) {
        result.hybrid_enabled = self.use_hybrid;

        for region in regions {
            let count = region.pixel_count();
            if count < self.min_pixels {
                result.diagnostics.noise_regions += 1;
                continue;
            }
            debug_assert!(
                region.moments.sum_i > 0,
                "region {} reached extraction with zero intensity",
                region.id
            );

            if count <= self.max_pixels {
                let (x, y) = region.moments.centroid();
                let spot = Spot::new(x, y, region.moments.mean_intensity(), SpotMethod::CenterOfMass);
                result.com_spots.push(spot);
                if self.use_hybrid {
                    result.hybrid_spots.push(spot);
                }
                continue;
            }

            result.diagnostics.pileup_regions += 1;
            if self.use_hybrid {
                self.decompose(state, region, result);
            }
        }

        if result.com_spots.is_truncated() || result.hybrid_spots.is_truncated() {
            debug!(
                "spot lists full: {} CoM and {} hybrid spots dropped",
                result.com_spots.dropped(),
                result.hybrid_spots.dropped()
            );
        }
    }

    /// Hybrid gradient decomposition of one pileup region.
    fn decompose(&mut self, state: &LabelState, region: &ResolvedRegion, result: &mut FrameResult) {
        self.collect_candidates(state, region);
        result.diagnostics.candidates_dropped += self.candidates.dropped();

        let intensity = region.moments.mean_intensity();
        let candidates = self.candidates.as_mut_slice();
        merge_nearby(candidates, self.merge_radius);
        for merged in candidates.iter().filter(|c| !c.absorbed) {
            result
                .hybrid_spots
                .push(Spot::new(merged.x, merged.y, intensity, SpotMethod::HybridGradient));
        }
    }

    /// Scans the window around the region's centre for zero-crossings of the
    /// intensity gradient on both axes.
    fn collect_candidates(&mut self, state: &LabelState, region: &ResolvedRegion) {
        self.candidates.clear();

        let (cx, cy) = region.moments.integer_centroid();
        let half = i64::from(self.window_size / 2);
        // x+2 and y+2 are read, so stop two pixels short of the AoI edge
        let x_start = (cx as i64 - half).max(i64::from(self.aoi.x_lower) + 1);
        let x_end = (cx as i64 + half).min(i64::from(self.aoi.x_upper) - 2);
        let y_start = (cy as i64 - half).max(i64::from(self.aoi.y_lower) + 1);
        let y_end = (cy as i64 + half).min(i64::from(self.aoi.y_upper) - 2);
        if x_start >= x_end || y_start >= y_end {
            return;
        }

        let pixel = |x: usize, y: usize| i32::from(state.pixel(x, y));
        for y in y_start as usize..y_end as usize {
            for x in x_start as usize..x_end as usize {
                if state.label(x, y) != region.id {
                    continue;
                }
                let centre = pixel(x, y);
                let (left, right, right2) = (pixel(x - 1, y), pixel(x + 1, y), pixel(x + 2, y));
                let (up, down, down2) = (pixel(x, y - 1), pixel(x, y + 1), pixel(x, y + 2));

                // rising into the pixel and falling two steps past it, on both axes
                let peak_y = down >= up && centre > down2;
                let peak_x = right >= left && centre > right2;
                if !(peak_x && peak_y) {
                    continue;
                }

                // linear interpolation between the central differences at p and p+1
                let root_x = x as f64 + f64::from(right - left) / f64::from(centre + right - right2 - left);
                let root_y = y as f64 + f64::from(down - up) / f64::from(centre + down - down2 - up);
                self.candidates.push(Candidate {
                    x: root_x,
                    y: root_y,
                    weight: f64::from(centre),
                    absorbed: false,
                });
            }
        }
    }
}

/// Folds candidates closer than `radius` on both axes into the earliest one
/// as a running intensity-weighted average. Folded candidates are marked
/// `absorbed`.
fn merge_nearby(candidates: &mut [Candidate], radius: f64) {
    for k in 0..candidates.len() {
        if candidates[k].absorbed {
            continue;
        }
        for l in (k + 1)..candidates.len() {
            let (keep, other) = (candidates[k], candidates[l]);
            if other.absorbed || (other.x - keep.x).abs() >= radius || (other.y - keep.y).abs() >= radius {
                continue;
            }
            let weight = keep.weight + other.weight;
            candidates[k].x = (keep.x * keep.weight + other.x * other.weight) / weight;
            candidates[k].y = (keep.y * keep.weight + other.y * other.weight) / weight;
            candidates[k].weight = weight;
            candidates[l].absorbed = true;
        }
    }
}
