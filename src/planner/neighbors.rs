use kiddo::float::{distance::SquaredEuclidean, kdtree::Axis, kdtree::KdTree};
use num_traits::Float;

/// A nearest-neighbor index over N-dimensional keys with opaque `usize`
/// payloads (the planner's vertex handles).
///
/// The planner rebuilds the index from scratch after any pruning operation,
/// so implementations never need to support removal.
pub trait NearestNeighbors<F: Float, const N: usize> {
    /// Constructs an empty index.
    fn new() -> Self;

    /// Adds a key with its payload.
    fn add(&mut self, key: [F; N], item: usize);

    /// The payload of the key nearest to `key`, if the index is non-empty.
    fn nearest_one(&self, key: &[F; N]) -> Option<usize>;

    /// The payloads of all keys within `radius` of `key`, in no particular
    /// order.
    fn within_radius(&self, key: &[F; N], radius: F) -> Vec<usize>;

    /// The number of stored keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A brute-force index. Useful for small trees and as a reference for
/// testing the k-d tree implementation.
pub struct LinearNearestNeighbors<F: Float, const N: usize> {
    entries: Vec<([F; N], usize)>,
}

fn distance_squared<F: Float, const N: usize>(a: &[F; N], b: &[F; N]) -> F {
    let mut sum = F::zero();
    for i in 0..N {
        let diff = a[i] - b[i];
        sum = sum + diff * diff;
    }
    sum
}

impl<F: Float, const N: usize> NearestNeighbors<F, N> for LinearNearestNeighbors<F, N> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add(&mut self, key: [F; N], item: usize) {
        self.entries.push((key, item));
    }

    fn nearest_one(&self, key: &[F; N]) -> Option<usize> {
        self.entries
            .iter()
            .min_by(|a, b| {
                distance_squared(key, &a.0)
                    .partial_cmp(&distance_squared(key, &b.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, item)| *item)
    }

    fn within_radius(&self, key: &[F; N], radius: F) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|(k, _)| distance_squared(key, k) <= radius * radius)
            .map(|(_, item)| *item)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A k-d tree index backed by kiddo.
pub struct KdTreeNearestNeighbors<F: Float + Axis, const N: usize> {
    kdtree: KdTree<F, usize, N, 32, u32>,
    len: usize,
}

impl<F: Float + Axis, const N: usize> NearestNeighbors<F, N> for KdTreeNearestNeighbors<F, N> {
    fn new() -> Self {
        Self {
            kdtree: KdTree::new(),
            len: 0,
        }
    }

    fn add(&mut self, key: [F; N], item: usize) {
        self.kdtree.add(&key, item);
        self.len += 1;
    }

    fn nearest_one(&self, key: &[F; N]) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        Some(self.kdtree.nearest_one::<SquaredEuclidean>(key).item)
    }

    fn within_radius(&self, key: &[F; N], radius: F) -> Vec<usize> {
        self.kdtree
            .within_unsorted::<SquaredEuclidean>(key, radius * radius)
            .iter()
            .map(|neighbor| neighbor.item)
            .collect()
    }

    fn len(&self) -> usize {
        self.len
    }
}
