use crate::obstacles::AnalyticObstacle;
use crate::system::RealVectorState;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// An axis-aligned hyper-rectangular obstacle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectangularObstacle<F: Float, const N: usize> {
    min_corner: RealVectorState<F, N>,
    max_corner: RealVectorState<F, N>,
}

impl<F: Float, const N: usize> RectangularObstacle<F, N> {
    pub fn new(min_corner: RealVectorState<F, N>, max_corner: RealVectorState<F, N>) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    pub fn min_corner(&self) -> &RealVectorState<F, N> {
        &self.min_corner
    }

    pub fn max_corner(&self) -> &RealVectorState<F, N> {
        &self.max_corner
    }
}

impl<F: Float, const N: usize> AnalyticObstacle<F, N> for RectangularObstacle<F, N> {
    fn contains(&self, state: &RealVectorState<F, N>) -> bool {
        (0..N).all(|i| state[i] >= self.min_corner[i] && state[i] <= self.max_corner[i])
    }

    /// Liang-Barsky slab clipping of the parametric segment
    /// `p(t) = start + t * (end - start)` against each axis interval; the
    /// segment intersects iff the accumulated [t_min, t_max] window stays
    /// non-empty within [0, 1].
    fn intersects_edge(&self, start: &RealVectorState<F, N>, end: &RealVectorState<F, N>) -> bool {
        let direction = end - start;
        let mut t_min = F::zero();
        let mut t_max = F::one();

        for i in 0..N {
            let s = start[i];
            let d = direction[i];

            if d == F::zero() {
                if s < self.min_corner[i] || s > self.max_corner[i] {
                    return false;
                }
            } else {
                let inv_d = F::one() / d;
                let mut t1 = (self.min_corner[i] - s) * inv_d;
                let mut t2 = (self.max_corner[i] - s) * inv_d;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return false;
                }
            }
        }

        !(t_max < F::zero() || t_min > F::one())
    }
}

#[cfg(test)]
mod tests {
    use super::RectangularObstacle;
    use crate::obstacles::AnalyticObstacle;
    use crate::system::RealVectorState;

    fn unit_box() -> RectangularObstacle<f32, 2> {
        RectangularObstacle::new(
            RealVectorState::new([1.0, 1.0]),
            RealVectorState::new([2.0, 2.0]),
        )
    }

    #[test]
    fn containment_includes_the_boundary() {
        let obstacle = unit_box();
        assert!(obstacle.contains(&RealVectorState::new([1.5, 1.5])));
        assert!(obstacle.contains(&RealVectorState::new([1.0, 2.0])));
        assert!(!obstacle.contains(&RealVectorState::new([0.99, 1.5])));
    }

    #[test]
    fn crossing_segment_intersects() {
        let obstacle = unit_box();
        let a = RealVectorState::new([0.0, 1.5]);
        let b = RealVectorState::new([3.0, 1.5]);
        assert!(obstacle.intersects_edge(&a, &b));
    }

    #[test]
    fn parallel_segment_outside_the_slab_misses() {
        let obstacle = unit_box();
        let a = RealVectorState::new([0.0, 0.5]);
        let b = RealVectorState::new([3.0, 0.5]);
        assert!(!obstacle.intersects_edge(&a, &b));
    }

    #[test]
    fn segment_stopping_short_misses() {
        let obstacle = unit_box();
        let a = RealVectorState::new([0.0, 1.5]);
        let b = RealVectorState::new([0.9, 1.5]);
        assert!(!obstacle.intersects_edge(&a, &b));
    }
}
