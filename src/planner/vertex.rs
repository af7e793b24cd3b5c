use crate::system::RealVectorState;
use num_traits::Float;

/// An edge record cached on its child vertex.
///
/// The endpoint states live on the parent and child vertices; the edge
/// carries the steering cost and the steering model's per-edge cache so the
/// connection can be re-materialized without solving the steering query
/// again.
#[derive(Clone, Debug)]
pub struct Edge<C, D> {
    pub cost: C,
    pub opt_data: D,
}

/// A vertex in the planner's tree arena.
///
/// Vertices are addressed by stable `usize` handles into the planner's
/// vertex list; `parent` and `children` store handles, never references.
/// The handles stay valid until the planner compacts the arena (pruning or
/// root switching), which remaps every stored handle in the same pass.
#[derive(Clone, Debug)]
pub struct Vertex<F: Float, const N: usize, C, D> {
    pub(crate) state: RealVectorState<F, N>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) edge_from_parent: Option<Edge<C, D>>,
    pub(crate) cost_from_parent: C,
    pub(crate) cost_from_root: C,
    /// Scratch bit for subtree sweeps; false outside of them.
    pub(crate) mark: bool,
}

impl<F: Float, const N: usize, C: Copy, D> Vertex<F, N, C, D> {
    /// A parentless vertex with both cost fields set to `cost`.
    pub(crate) fn new(state: RealVectorState<F, N>, cost: C) -> Self {
        Self {
            state,
            parent: None,
            children: Vec::new(),
            edge_from_parent: None,
            cost_from_parent: cost,
            cost_from_root: cost,
            mark: false,
        }
    }

    pub(crate) fn add_child(&mut self, child: usize) {
        debug_assert!(!self.children.contains(&child));
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: usize) {
        if let Some(index) = self.children.iter().position(|&handle| handle == child) {
            self.children.remove(index);
        } else {
            debug_assert!(false, "vertex has no child {}", child);
        }
    }

    pub fn state(&self) -> &RealVectorState<F, N> {
        &self.state
    }

    /// The parent handle; `None` only for the root.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// The incoming edge; present iff `parent` is set.
    pub fn edge_from_parent(&self) -> Option<&Edge<C, D>> {
        self.edge_from_parent.as_ref()
    }

    pub fn cost_from_parent(&self) -> C {
        self.cost_from_parent
    }

    pub fn cost_from_root(&self) -> C {
        self.cost_from_root
    }
}
