//! Region arena with union-find equivalence tracking.
//!
//! Region ids are small positive integers handed out in scan order; id 0 is
//! reserved for "unassigned". Every region carries running intensity moments
//! and a parent link. Roots point at themselves.
//!
//! Merging always makes the smaller root the parent of the larger one, so the
//! canonical root of an equivalence class is its lowest-numbered region.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running intensity moments of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Moments {
    /// Sum of x * intensity.
    pub sum_xi: u64,
    /// Sum of y * intensity.
    pub sum_yi: u64,
    /// Sum of intensity.
    pub sum_i: u64,
    /// Number of pixels.
    pub count: u32,
}

impl Moments {
    /// Adds one pixel.
    #[inline]
    pub fn add_pixel(&mut self, x: usize, y: usize, intensity: u8) {
        let i = u64::from(intensity);
        self.sum_xi += x as u64 * i;
        self.sum_yi += y as u64 * i;
        self.sum_i += i;
        self.count += 1;
    }

    /// Adds another region's moments into this one.
    #[inline]
    pub fn absorb(&mut self, other: &Moments) {
        self.sum_xi += other.sum_xi;
        self.sum_yi += other.sum_yi;
        self.sum_i += other.sum_i;
        self.count += other.count;
    }

    /// Intensity-weighted centre. Requires a nonzero intensity sum.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> (f64, f64) {
        debug_assert!(self.sum_i > 0, "centroid of a region with zero intensity");
        let total = self.sum_i as f64;
        (self.sum_xi as f64 / total, self.sum_yi as f64 / total)
    }

    /// Centre truncated to whole pixels with integer division.
    #[inline]
    #[must_use]
    pub fn integer_centroid(&self) -> (u64, u64) {
        debug_assert!(self.sum_i > 0, "centroid of a region with zero intensity");
        (self.sum_xi / self.sum_i, self.sum_yi / self.sum_i)
    }

    /// Mean pixel intensity. Requires a nonzero pixel count.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_intensity(&self) -> f64 {
        debug_assert!(self.count > 0, "mean intensity of an empty region");
        self.sum_i as f64 / f64::from(self.count)
    }
}

/// Fixed-capacity arena of regions.
#[derive(Debug, Clone)]
pub struct RegionTable {
    parent: Vec<u32>,
    moments: Vec<Moments>,
    capacity: usize,
    exhausted: bool,
}

impl RegionTable {
    /// Creates a table that can hand out `capacity` region ids per frame.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut table = Self {
            parent: Vec::with_capacity(capacity + 1),
            moments: Vec::with_capacity(capacity + 1),
            capacity,
            exhausted: false,
        };
        table.reset();
        table
    }

    /// Forgets every region. Keeps the allocation.
    pub fn reset(&mut self) {
        self.parent.clear();
        self.moments.clear();
        // slot 0: the "unassigned" sentinel
        self.parent.push(0);
        self.moments.push(Moments::default());
        self.exhausted = false;
    }

    /// Number of ids handed out since the last reset.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len() - 1
    }

    /// True if no id has been handed out.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of ids per frame.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether an allocation has been refused since the last reset.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Hands out a fresh root id, or `None` once the table is full.
    #[allow(clippy::cast_possible_truncation)]
    pub fn allocate(&mut self) -> Option<u32> {
        if self.len() >= self.capacity {
            self.exhausted = true;
            return None;
        }
        let id = self.parent.len() as u32;
        self.parent.push(id);
        self.moments.push(Moments::default());
        Some(id)
    }

    /// Finds the root of `id`, pointing every link on the way directly at it.
    pub fn find(&mut self, id: u32) -> u32 {
        let mut root = id;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut current = id;
        while current != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        root
    }

    /// Root of `id` without modifying the table.
    #[must_use]
    pub fn root_of(&self, id: u32) -> u32 {
        let mut root = id;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        root
    }

    /// Merges the classes of `a` and `b` and returns the surviving root,
    /// which is always the smaller of the two roots.
    pub fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        match ra.cmp(&rb) {
            std::cmp::Ordering::Less => {
                self.parent[rb as usize] = ra;
                ra
            }
            std::cmp::Ordering::Greater => {
                self.parent[ra as usize] = rb;
                rb
            }
            std::cmp::Ordering::Equal => ra,
        }
    }

    /// True if `id` is currently a root.
    #[inline]
    #[must_use]
    pub fn is_root(&self, id: u32) -> bool {
        self.parent[id as usize] == id
    }

    /// Adds a pixel to the moments stored under `id`.
    #[inline]
    pub fn accumulate(&mut self, id: u32, x: usize, y: usize, intensity: u8) {
        self.moments[id as usize].add_pixel(x, y, intensity);
    }

    /// Moments stored under `id`.
    #[inline]
    #[must_use]
    pub fn moments(&self, id: u32) -> &Moments {
        &self.moments[id as usize]
    }

    /// Moves the moments stored under `from` into `into`, leaving `from` empty.
    pub(crate) fn transfer(&mut self, from: u32, into: u32) {
        let moved = std::mem::take(&mut self.moments[from as usize]);
        self.moments[into as usize].absorb(&moved);
    }

    /// Allocated ids in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = u32> {
        1..self.parent.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_until_exhausted() {
        let mut table = RegionTable::with_capacity(2);
        assert_eq!(table.allocate(), Some(1));
        assert_eq!(table.allocate(), Some(2));
        assert!(!table.is_exhausted());
        assert_eq!(table.allocate(), None);
        assert!(table.is_exhausted());
        assert_eq!(table.len(), 2);

        table.reset();
        assert!(table.is_empty());
        assert!(!table.is_exhausted());
        assert_eq!(table.allocate(), Some(1));
    }

    #[test]
    fn test_union_keeps_smaller_root() {
        let mut table = RegionTable::with_capacity(8);
        for _ in 0..5 {
            table.allocate();
        }
        assert_eq!(table.union(4, 2), 2);
        assert_eq!(table.union(5, 3), 3);
        assert_eq!(table.union(4, 5), 2);
        assert_eq!(table.find(5), 2);
        assert_eq!(table.find(3), 2);
        assert!(table.is_root(1));
        assert!(!table.is_root(3));
        assert_eq!(table.union(2, 3), 2);
    }

    #[test]
    fn test_find_compresses_path() {
        let mut table = RegionTable::with_capacity(8);
        for _ in 0..4 {
            table.allocate();
        }
        // chain 4 -> 3 -> 2 -> 1
        table.union(3, 4);
        table.union(2, 3);
        table.union(1, 2);
        assert_eq!(table.root_of(4), 1);

        assert_eq!(table.find(4), 1);
        assert_eq!(table.parent[4], 1);
        assert_eq!(table.parent[3], 1);
    }

    #[test]
    fn test_moments() {
        let mut moments = Moments::default();
        moments.add_pixel(10, 20, 30);
        moments.add_pixel(12, 20, 10);

        let (x, y) = moments.centroid();
        assert!((x - 10.5).abs() < 1e-12);
        assert!((y - 20.0).abs() < 1e-12);
        assert!((moments.mean_intensity() - 20.0).abs() < 1e-12);
        assert_eq!(moments.integer_centroid(), (10, 20));
    }

    #[test]
    fn test_transfer_empties_source() {
        let mut table = RegionTable::with_capacity(4);
        let a = table.allocate().unwrap();
        let b = table.allocate().unwrap();
        table.accumulate(a, 1, 1, 50);
        table.accumulate(b, 2, 1, 50);

        table.transfer(b, a);
        assert_eq!(table.moments(a).count, 2);
        assert_eq!(table.moments(b), &Moments::default());
    }
}
