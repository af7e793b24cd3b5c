use crate::obstacles::AnalyticObstacle;
use crate::system::RealVectorState;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// A spherical obstacle (a disk in the plane) with exact containment and
/// segment-intersection checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphericalObstacle<F: Float, const N: usize> {
    center: RealVectorState<F, N>,
    radius: F,
}

impl<F: Float, const N: usize> SphericalObstacle<F, N> {
    pub fn new(center: RealVectorState<F, N>, radius: F) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> &RealVectorState<F, N> {
        &self.center
    }

    pub fn radius(&self) -> F {
        self.radius
    }
}

impl<F: Float, const N: usize> AnalyticObstacle<F, N> for SphericalObstacle<F, N> {
    fn contains(&self, state: &RealVectorState<F, N>) -> bool {
        self.center.euclidean_distance_squared(state) < self.radius.powi(2)
    }

    fn intersects_edge(&self, start: &RealVectorState<F, N>, end: &RealVectorState<F, N>) -> bool {
        if self.contains(start) || self.contains(end) {
            return true;
        }

        // roots of |start + t*(end - start) - center|^2 = radius^2
        let direction = end - start;
        let center_to_start = start - &self.center;
        let a = direction.dot(&direction);
        let b = F::from(2.0).unwrap() * center_to_start.dot(&direction);
        let c = center_to_start.dot(&center_to_start) - self.radius.powi(2);
        let discriminant = b * b - F::from(4.0).unwrap() * a * c;

        if discriminant < F::zero() {
            return false;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let two_a = F::from(2.0).unwrap() * a;
        let t1 = (-b - sqrt_discriminant) / two_a;
        let t2 = (-b + sqrt_discriminant) / two_a;

        (t1 >= F::zero() && t1 <= F::one()) || (t2 >= F::zero() && t2 <= F::one())
    }
}
