use crate::system::{RealVectorState, Trajectory};
use num_traits::Float;
use std::ops::Add;

/// Cost algebra for a steering model.
///
/// The planner relies only on ordering and addition; a cost may be a plain
/// scalar or any richer value type satisfying these bounds. Incomparable
/// pairs are resolved with a deterministic tiebreak wherever the planner
/// sorts by cost.
pub trait Cost: Copy + PartialOrd + Add<Output = Self> {}

impl<T: Copy + PartialOrd + Add<Output = T>> Cost for T {}

/// The steering capability the planner is parameterized over.
///
/// A `System` knows how to sample states, decide goal membership, project
/// states to spatial-index keys, solve the two-point steering problem
/// between states, cost the result, and check it against obstacles.
///
/// Template Parameters:
/// - `F`: The floating-point type.
/// - `N`: The dimension of the state space.
/// - `M`: The dimension of the control space.
pub trait System<F: Float, const N: usize, const M: usize> {
    /// Per-edge cache written by [`System::evaluate_extend_cost`] and read
    /// by [`System::extend_to`], so the steering query is not solved twice
    /// for the same edge. `Default` is the "not yet computed" sentinel; an
    /// implementation receiving it computes and caches rather than failing.
    type OptData: Clone + Default;

    /// The cost type of this system's steering connections.
    type Cost: Cost;

    /// Draws a state from the configuration space. Implementations may or
    /// may not reject states in collision. Returns `None` when no state can
    /// be produced this call.
    fn sample_state(&mut self) -> Option<RealVectorState<F, N>>;

    /// Draws a state from the goal region.
    fn sample_in_goal(&mut self) -> Option<RealVectorState<F, N>>;

    /// Returns whether a state lies in the goal region.
    fn is_in_goal(&self, state: &RealVectorState<F, N>) -> bool;

    /// Returns whether a state is in collision with the obstacle field.
    fn is_in_collision(&self, state: &RealVectorState<F, N>) -> bool;

    /// Projects a state to an N-dimensional point for spatial indexing.
    /// Must be consistent with the metric underlying the steering cost,
    /// otherwise the shrinking near-radius loses its coverage guarantee.
    fn key(&self, state: &RealVectorState<F, N>) -> [F; N];

    /// Computes the cost of the optimal steering connection `start → end`
    /// and records solver hints in `opt_data`. Performs no collision
    /// checks. `None` means `end` is unreachable from `start`.
    fn evaluate_extend_cost(
        &self,
        start: &RealVectorState<F, N>,
        end: &RealVectorState<F, N>,
        opt_data: &mut Self::OptData,
    ) -> Option<Self::Cost>;

    /// Materializes the steering connection `start → end` as a trajectory,
    /// consuming the hints in `opt_data` (and populating them first when
    /// `opt_data` is still the default sentinel). With `check_obstacles`
    /// set, fails when any state along the trajectory is in collision.
    ///
    /// After a successful obstacle-checked extension, `opt_data` is left
    /// consistent with the cost previously returned by
    /// [`System::evaluate_extend_cost`]; callers may install that cost
    /// without re-evaluating.
    fn extend_to(
        &self,
        start: &RealVectorState<F, N>,
        end: &RealVectorState<F, N>,
        check_obstacles: bool,
        opt_data: &mut Self::OptData,
    ) -> Option<Trajectory<F, N, M>>;

    /// Returns whether every state of the trajectory is collision-free
    /// under the current obstacle field.
    fn is_safe_trajectory(&self, trajectory: &Trajectory<F, N, M>) -> bool;

    /// The additive identity of this system's cost algebra.
    fn zero_cost(&self) -> Self::Cost;

    /// The absorbing upper bound of this system's cost algebra.
    fn inf_cost(&self) -> Self::Cost;
}
