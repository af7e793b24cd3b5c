use thiserror::Error;

/// Why a planner iteration produced no new vertex.
///
/// All variants are transient: the caller's usual response is to run the
/// next iteration.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum IterationError {
    /// The sampler could not produce a state this iteration.
    #[error("sampler produced no state")]
    SampleUnavailable,
    /// The spatial index returned no near vertices and no nearest fallback;
    /// the tree has not been initialized.
    #[error("no near vertices and no nearest fallback")]
    NearQueryEmpty,
    /// Every near candidate failed obstacle-checked steering to the sample.
    #[error("no collision-free connection from any near vertex")]
    NoFeasibleParent,
    /// Branch-and-bound rejected the sample: its candidate cost already
    /// exceeds the best goal cost.
    #[error("candidate cost exceeds the best goal cost")]
    PrunedByBound,
}

/// Why a tree revalidation could not run.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TreeRepairError {
    /// The root itself is in collision; the current plan is unrecoverable
    /// and the caller must re-initialize.
    #[error("root state is in collision")]
    RootInCollision,
}

/// Why the root could not be advanced along the committed trajectory.
///
/// Apart from [`SwitchRootError::NoBestVertex`], these leave the tree in an
/// indeterminate state; the caller must re-initialize and replan.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SwitchRootError {
    /// No goal-reaching vertex exists to commit along.
    #[error("no goal-reaching vertex to commit along")]
    NoBestVertex,
    /// A best-path edge could no longer be re-materialized from its cached
    /// steering data.
    #[error("a best-path edge could not be re-materialized")]
    EdgeReconstructionFailed,
    /// Steering from the new root to the first surviving child failed.
    #[error("steering from the new root to its child failed")]
    NewRootEdgeExtendFailed,
    /// Cost evaluation from the new root to the first surviving child
    /// failed.
    #[error("cost evaluation from the new root to its child failed")]
    NewRootEdgeCostFailed,
}
