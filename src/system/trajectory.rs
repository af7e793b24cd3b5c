use crate::system::RealVectorState;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// A discretized trajectory through N-dimensional state space under
/// M-dimensional controls.
///
/// `states` and `controls` advance together (one control per state sample)
/// and `total_variation` accumulates the path length the steering model
/// assigned to the connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trajectory<F: Float, const N: usize, const M: usize> {
    pub states: Vec<RealVectorState<F, N>>,
    pub controls: Vec<RealVectorState<F, M>>,
    pub total_variation: F,
}

impl<F: Float, const N: usize, const M: usize> Trajectory<F, N, M> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            controls: Vec::new(),
            total_variation: F::zero(),
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.controls.clear();
        self.total_variation = F::zero();
    }

    pub fn push(&mut self, state: RealVectorState<F, N>, control: RealVectorState<F, M>) {
        self.states.push(state);
        self.controls.push(control);
    }

    /// Moves `other` onto the end of this trajectory, accumulating its
    /// total variation.
    pub fn append(&mut self, other: Trajectory<F, N, M>) {
        self.states.extend(other.states);
        self.controls.extend(other.controls);
        self.total_variation = self.total_variation + other.total_variation;
    }

    /// Reverses the state and control sequences in place. The total
    /// variation is unchanged.
    pub fn reverse(&mut self) {
        self.states.reverse();
        self.controls.reverse();
    }

    pub fn first_state(&self) -> Option<&RealVectorState<F, N>> {
        self.states.first()
    }

    pub fn last_state(&self) -> Option<&RealVectorState<F, N>> {
        self.states.last()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<F: Float, const N: usize, const M: usize> Default for Trajectory<F, N, M> {
    fn default() -> Self {
        Self::new()
    }
}
