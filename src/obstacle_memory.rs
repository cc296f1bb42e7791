//! C4: the obstacle memory. A fixed-capacity ring of per-scan
//! nearest-neighbour indices so that an obstacle observed recently, but no
//! longer in the current scan, is still respected for a bounded number of
//! scans.
//!
//! Section 9's design note singles this out as the one capability worth
//! abstracting (`{insert(cloud), min_mean_distance(point, K) -> f64}`), so
//! the spatial index implementation (k-d tree here, but a grid or octree
//! would also satisfy the trait) is swappable without touching the
//! collision evaluator or selector.

use nalgebra::Vector3;

/// The nearest-neighbour capability the obstacle memory needs from a spatial
/// index over one scan's worth of points.
pub trait SpatialIndex: Send + Sync {
    fn build(points: &[Vector3<f64>]) -> Self;

    /// Square root of the mean squared distance from `query` to its `k`
    /// nearest neighbours (or to however many points the index holds, if
    /// fewer than `k`).
    fn mean_nn_distance(&self, query: &Vector3<f64>, k: usize) -> f64;

    fn len(&self) -> usize;
}

/// k-d tree backed implementation, adapted to the `kiddo` 2.x API
/// (`KdTree::add` + `nearest_n::<SquaredEuclidean>`).
pub struct KdIndex {
    tree: kiddo::KdTree<f64, 3>,
    count: usize,
}

impl SpatialIndex for KdIndex {
    fn build(points: &[Vector3<f64>]) -> Self {
        let mut tree = kiddo::KdTree::new();
        for (i, p) in points.iter().enumerate() {
            tree.add(&[p.x, p.y, p.z], i as u64);
        }
        Self {
            tree,
            count: points.len(),
        }
    }

    fn mean_nn_distance(&self, query: &Vector3<f64>, k: usize) -> f64 {
        if self.count == 0 {
            return f64::INFINITY;
        }
        let k = k.min(self.count).max(1);
        let neighbours = self
            .tree
            .nearest_n::<kiddo::SquaredEuclidean>(&[query.x, query.y, query.z], k);
        let mean_sq: f64 =
            neighbours.iter().map(|n| n.distance).sum::<f64>() / neighbours.len() as f64;
        mean_sq.sqrt()
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Sentinel distance returned when the memory has no populated entries at
/// all; larger than any realistic sensor range.
pub const EMPTY_SENTINEL: f64 = 100.0;

/// The bounded ring of recent scans.
pub struct ObstacleMemory<T: SpatialIndex = KdIndex> {
    ring: Vec<Option<T>>,
    cursor: usize,
    occupied: usize,
}

impl<T: SpatialIndex> ObstacleMemory<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "obstacle memory capacity must be positive");
        Self {
            ring: (0..capacity).map(|_| None).collect(),
            cursor: 0,
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    /// True until the ring has first filled.
    pub fn is_virgin(&self) -> bool {
        self.occupied < self.ring.len()
    }

    /// Inserts one scan's points, overwriting the oldest entry if the ring
    /// is already full.
    pub fn insert(&mut self, points: &[Vector3<f64>]) {
        self.ring[self.cursor] = Some(T::build(points));
        self.cursor = (self.cursor + 1) % self.ring.len();
        self.occupied = (self.occupied + 1).min(self.ring.len());
    }

    /// Minimum, across all populated ring entries, of the mean nearest-`k`
    /// distance to `point`. Returns [`EMPTY_SENTINEL`] if nothing has ever
    /// been inserted.
    pub fn min_mean_dist(&self, point: &Vector3<f64>, k: usize) -> f64 {
        let mut best = f64::INFINITY;
        for entry in self.ring.iter().flatten() {
            let d = entry.mean_nn_distance(point, k);
            if d < best {
                best = d;
            }
        }
        if best.is_finite() {
            best
        } else {
            EMPTY_SENTINEL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_memory_returns_sentinel() {
        let mem: ObstacleMemory<KdIndex> = ObstacleMemory::new(4);
        assert_relative_eq!(mem.min_mean_dist(&Vector3::zeros(), 3), EMPTY_SENTINEL);
    }

    #[test]
    fn finds_nearby_obstacle() {
        let mut mem: ObstacleMemory<KdIndex> = ObstacleMemory::new(4);
        mem.insert(&[Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.1, 0.0, 0.0)]);
        let d = mem.min_mean_dist(&Vector3::new(0.0, 0.0, 0.0), 2);
        assert!(d < EMPTY_SENTINEL);
        assert!(d > 0.9 && d < 1.2, "d={d}");
    }

    #[test]
    fn ring_overwrites_oldest_on_overflow() {
        let mut mem: ObstacleMemory<KdIndex> = ObstacleMemory::new(2);
        mem.insert(&[Vector3::new(5.0, 0.0, 0.0)]);
        assert!(mem.is_virgin());
        mem.insert(&[Vector3::new(5.0, 0.0, 0.0)]);
        assert!(!mem.is_virgin());
        // third insert overwrites the first slot; capacity never exceeded.
        mem.insert(&[Vector3::new(5.0, 0.0, 0.0)]);
        assert_eq!(mem.capacity(), 2);
    }

    #[test]
    fn memory_retention_then_purge() {
        // An obstacle seen once should still be reported for `capacity`
        // further scans, then purged.
        let capacity = 3;
        let mut mem: ObstacleMemory<KdIndex> = ObstacleMemory::new(capacity);
        mem.insert(&[Vector3::new(3.0, 0.0, 1.0)]);
        let probe = Vector3::new(3.0, 0.0, 1.0);
        for _ in 0..capacity {
            assert!(mem.min_mean_dist(&probe, 1) < 0.5);
            mem.insert(&[]); // empty scan: obstacle no longer observed
        }
        // after `capacity` empty scans the original observation is purged
        assert_eq!(mem.min_mean_dist(&probe, 1), EMPTY_SENTINEL);
    }
}
