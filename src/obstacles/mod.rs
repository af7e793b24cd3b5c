pub mod rectangular_obstacle;
pub mod spherical_obstacle;
pub mod validity_checker;

pub use rectangular_obstacle::RectangularObstacle;
pub use spherical_obstacle::SphericalObstacle;
pub use validity_checker::{AlwaysValid, ValidityChecker};

use crate::system::RealVectorState;
use num_traits::Float;

/// An obstacle with exact containment and segment-intersection predicates;
/// no discrete sampling or approximation is involved.
pub trait AnalyticObstacle<F: Float, const N: usize> {
    fn contains(&self, state: &RealVectorState<F, N>) -> bool;
    fn intersects_edge(&self, start: &RealVectorState<F, N>, end: &RealVectorState<F, N>) -> bool;
}

/// Treats a set of analytic obstacles as a validity checker: a state or
/// edge is valid when no obstacle contains or intersects it.
pub struct AnalyticValidityChecker<F: Float, const N: usize, O: AnalyticObstacle<F, N>> {
    obstacles: Vec<O>,
    _phantom: std::marker::PhantomData<F>,
}

impl<F: Float, const N: usize, O: AnalyticObstacle<F, N>> AnalyticValidityChecker<F, N, O> {
    pub fn new(obstacles: Vec<O>) -> Self {
        Self {
            obstacles,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F: Float, const N: usize, O: AnalyticObstacle<F, N>> ValidityChecker<F, N>
    for AnalyticValidityChecker<F, N, O>
{
    fn is_state_valid(&self, state: &RealVectorState<F, N>) -> bool {
        self.obstacles
            .iter()
            .all(|obstacle| !obstacle.contains(state))
    }

    fn is_edge_valid(&self, start: &RealVectorState<F, N>, end: &RealVectorState<F, N>) -> bool {
        self.obstacles
            .iter()
            .all(|obstacle| !obstacle.intersects_edge(start, end))
    }
}
