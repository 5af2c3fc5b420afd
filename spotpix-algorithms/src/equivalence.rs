//! Equivalence resolution.
//!
//! After the raster pass, regions that met mid-scan are linked in the
//! [`RegionTable`](crate::regions::RegionTable) but their moments are still
//! spread over the ids the pixels were given at assignment time. Resolution
//! folds every non-root's moments into its root exactly once, rewrites the
//! label image to canonical roots, and lists the surviving components.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use spotpix_core::Rect;

use crate::labeling::LabelState;
use crate::regions::Moments;

/// A connected component after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedRegion {
    /// Canonical root id; the lowest id allocated within the component.
    pub id: u32,
    /// Moments of every pixel in the component.
    pub moments: Moments,
}

impl ResolvedRegion {
    /// Number of pixels in the component.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> u32 {
        self.moments.count
    }
}

/// Folds region equivalences into canonical roots.
#[derive(Debug, Clone, Copy)]
pub struct EquivalenceResolver {
    aoi: Rect,
}

impl EquivalenceResolver {
    /// Creates a resolver that relabels pixels inside `aoi`.
    #[must_use]
    pub fn new(aoi: Rect) -> Self {
        Self { aoi }
    }

    /// Resolves `state` in place and writes the components, in ascending id
    /// order, into `regions` (which is cleared first).
    ///
    /// Running it twice on the same state gives the same output: folded
    /// children are left with empty moments.
    pub fn resolve(&self, state: &mut LabelState, regions: &mut Vec<ResolvedRegion>) {
        regions.clear();
        let width = state.width();
        let (table, labels) = state.table_and_labels_mut();

        for id in table.ids() {
            let root = table.find(id);
            if root != id {
                table.transfer(id, root);
            }
        }

        for y in self.aoi.y_lower as usize..self.aoi.y_upper as usize {
            let row = &mut labels[y * width..(y + 1) * width];
            for label in &mut row[self.aoi.x_lower as usize..self.aoi.x_upper as usize] {
                if *label != 0 {
                    *label = table.find(*label);
                }
            }
        }

        regions.extend(table.ids().filter(|&id| table.is_root(id)).map(|id| {
            ResolvedRegion {
                id,
                moments: *table.moments(id),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::RegionLabeler;
    use spotpix_core::{CentroidConfig, Frame};

    fn resolve(data: &[u8], width: usize, height: usize) -> (LabelState, Vec<ResolvedRegion>) {
        let config = CentroidConfig::default();
        let frame = Frame::packed(data, width, height).unwrap();
        let labeler = RegionLabeler::new(&config, width, height);
        let mut state = LabelState::new(width, height, config.region_capacity);
        labeler.label(&frame, &mut state);

        let mut regions = Vec::new();
        EquivalenceResolver::new(labeler.aoi()).resolve(&mut state, &mut regions);
        (state, regions)
    }

    #[test]
    fn test_merged_moments_land_in_root() {
        #[rustfmt::skip]
        let data = [
            0, 0,  0,  0,  0,  0,
            0, 50, 0,  0,  30, 0,
            0, 50, 0,  0,  30, 0,
            0, 50, 40, 40, 30, 0,
            0, 0,  0,  0,  0,  0,
        ];
        let (state, regions) = resolve(&data, 6, 5);

        assert_eq!(regions.len(), 1);
        let region = regions[0];
        assert_eq!(region.id, 1);
        assert_eq!(region.pixel_count(), 8);
        assert_eq!(region.moments.sum_i, 50 * 3 + 40 * 2 + 30 * 3);
        assert_eq!(state.table().moments(2), &Moments::default());

        // every lit pixel now carries the root id
        for (x, y) in [(1, 1), (4, 1), (4, 2), (3, 3)] {
            assert_eq!(state.label(x, y), 1);
        }
    }

    #[test]
    fn test_staircase_chain() {
        // each new column opens a region that is later merged from below
        #[rustfmt::skip]
        let data = [
            0, 0,  0,  0,  0,  0,
            0, 0,  0,  0,  60, 0,
            0, 0,  0,  60, 60, 0,
            0, 0,  60, 60, 0,  0,
            0, 60, 60, 0,  0,  0,
            0, 0,  0,  0,  0,  0,
        ];
        let (_, regions) = resolve(&data, 6, 6);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_count(), 7);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        #[rustfmt::skip]
        let data = [
            0, 0,  0,  0,  0,  0,  0,
            0, 70, 0,  70, 0,  70, 0,
            0, 70, 70, 70, 0,  70, 0,
            0, 0,  0,  0,  0,  0,  0,
        ];
        let (mut state, first) = resolve(&data, 7, 4);
        let labels_after_first = state.labels().to_vec();

        let mut second = Vec::new();
        EquivalenceResolver::new(Rect::full(7, 4)).resolve(&mut state, &mut second);

        assert_eq!(first, second);
        assert_eq!(state.labels(), labels_after_first.as_slice());
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].pixel_count(), 5);
        assert_eq!(first[1].pixel_count(), 2);
    }
}
