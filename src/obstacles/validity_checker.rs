use crate::system::RealVectorState;
use num_traits::Float;

/// Checks if a state or edge is valid (i.e., not in collision).
pub trait ValidityChecker<F: Float, const N: usize> {
    /// Checks if a state is valid (i.e., does not collide with obstacles).
    fn is_state_valid(&self, state: &RealVectorState<F, N>) -> bool;

    /// Checks if the straight segment between two states is valid.
    fn is_edge_valid(&self, a: &RealVectorState<F, N>, b: &RealVectorState<F, N>) -> bool;
}

/// A validity checker for obstacle-free space: every state and edge is
/// valid.
pub struct AlwaysValid<F: Float, const N: usize> {
    _phantom: std::marker::PhantomData<F>,
}

impl<F: Float, const N: usize> AlwaysValid<F, N> {
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F: Float, const N: usize> Default for AlwaysValid<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, const N: usize> ValidityChecker<F, N> for AlwaysValid<F, N> {
    fn is_state_valid(&self, _state: &RealVectorState<F, N>) -> bool {
        true
    }

    fn is_edge_valid(&self, _a: &RealVectorState<F, N>, _b: &RealVectorState<F, N>) -> bool {
        true
    }
}
