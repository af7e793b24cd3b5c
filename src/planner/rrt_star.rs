use crate::planner::error::{IterationError, SwitchRootError, TreeRepairError};
use crate::planner::neighbors::NearestNeighbors;
use crate::planner::vertex::{Edge, Vertex};
use crate::system::{RealVectorState, System, Trajectory};
use crate::util::OrderedCost;
use log::{debug, warn};
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for the RRT* planner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PlannerConfig<F: Float> {
    /// Scales the shrinking near-neighbor radius
    /// `gamma * (ln(n+1)/(n+1))^(1/N)`.
    pub gamma: F,
    /// Probability in [0, 1] of drawing the per-iteration sample from the
    /// goal region.
    pub goal_sample_freq: F,
    /// Drop inserts whose candidate cost already exceeds the best goal
    /// cost.
    pub do_branch_and_bound: bool,
    /// Seed for the planner's internal RNG (the goal-bias coin). The
    /// steering model seeds its own sampler; reproducibility is entirely
    /// the caller's seeding policy.
    pub seed: u64,
}

impl<F: Float> Default for PlannerConfig<F> {
    fn default() -> Self {
        Self {
            gamma: F::from(2.5).unwrap(),
            goal_sample_freq: F::from(0.1).unwrap(),
            do_branch_and_bound: true,
            seed: 0,
        }
    }
}

/// An anytime RRT* planner over a pluggable steering model.
///
/// The tree lives in a vertex arena addressed by stable `usize` handles;
/// the spatial index stores the same handles as payloads. Pruning
/// operations compact the arena and rebuild the index in one pass, so no
/// stale handle ever survives into a query.
///
/// Template Parameters:
/// - `F`: The floating-point type.
/// - `N`: The dimension of the state space.
/// - `M`: The dimension of the control space.
/// - `S`: The steering model.
/// - `NN`: The nearest-neighbor index.
pub struct RrtStar<F, const N: usize, const M: usize, S, NN>
where
    F: Float,
    S: System<F, N, M>,
    NN: NearestNeighbors<F, N>,
{
    system: S,
    gamma: F,
    goal_sample_freq: F,
    do_branch_and_bound: bool,
    vertices: Vec<Vertex<F, N, S::Cost, S::OptData>>,
    index: NN,
    lower_bound_cost: S::Cost,
    lower_bound_vertex: Option<usize>,
    rng: StdRng,
}

impl<F, const N: usize, const M: usize, S, NN> RrtStar<F, N, M, S, NN>
where
    F: Float,
    S: System<F, N, M>,
    NN: NearestNeighbors<F, N>,
{
    /// The root's arena handle. `initialize` and every rebuild place the
    /// root first.
    const ROOT: usize = 0;

    pub fn new(system: S, config: PlannerConfig<F>) -> Self {
        let lower_bound_cost = system.inf_cost();
        Self {
            system,
            gamma: config.gamma,
            goal_sample_freq: config.goal_sample_freq,
            do_branch_and_bound: config.do_branch_and_bound,
            vertices: Vec::new(),
            index: NN::new(),
            lower_bound_cost,
            lower_bound_vertex: None,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Discards any existing tree and index and starts a fresh tree rooted
    /// at `root_state` with zero cost fields.
    pub fn initialize(&mut self, root_state: RealVectorState<F, N>, do_branch_and_bound: bool) {
        self.vertices.clear();
        self.index = NN::new();
        self.lower_bound_cost = self.system.inf_cost();
        self.lower_bound_vertex = None;
        self.do_branch_and_bound = do_branch_and_bound;
        self.push_root(root_state);
        debug_assert!(self.debug_check_tree_consistency());
    }

    /// Runs one RRT* step: sample, near query, best-parent selection,
    /// branch-and-bound insert, rewiring. Returns the handle of the new
    /// vertex.
    pub fn iteration(&mut self) -> Result<usize, IterationError> {
        // 1. sample, goal-biased
        let p = F::from(self.rng.gen::<f64>()).unwrap();
        let sample = if p < self.goal_sample_freq {
            self.system.sample_in_goal()
        } else {
            self.system.sample_state()
        }
        .ok_or(IterationError::SampleUnavailable)?;

        // 2. vertices within the shrinking radius, or the single nearest
        let near = self.near_vertices(&sample)?;

        // 3. cheapest near vertex with a collision-free connection
        let (parent, edge_cost, opt_data) = self
            .find_best_parent(&sample, &near)
            .ok_or(IterationError::NoFeasibleParent)?;

        // 4. insert unless branch-and-bound rules the sample out
        let new_vertex = self
            .insert_vertex(parent, sample, edge_cost, opt_data)
            .ok_or(IterationError::PrunedByBound)?;

        // 5. pull near vertices under the new vertex where that is cheaper
        self.rewire_vertices(new_vertex, &near);

        debug_assert!(self.debug_check_costs());
        Ok(new_vertex)
    }

    /// The number of vertices currently in the tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// The vertex arena. Handles index into this slice.
    pub fn vertices(&self) -> &[Vertex<F, N, S::Cost, S::OptData>] {
        &self.vertices
    }

    /// The root vertex, once `initialize` has run.
    pub fn root(&self) -> Option<&Vertex<F, N, S::Cost, S::OptData>> {
        self.vertices.first()
    }

    /// The handle of the cheapest goal-resident vertex, if one exists.
    pub fn best_vertex(&self) -> Option<usize> {
        self.lower_bound_vertex
    }

    /// The cost of the best goal-resident vertex, or the system's infinite
    /// cost when none exists.
    pub fn best_cost(&self) -> S::Cost {
        self.lower_bound_cost
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Mutable access to the steering model, e.g. to swap the obstacle
    /// field before a `check_tree` pass.
    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    /// Reconstructs the root-to-goal trajectory through the best vertex by
    /// re-materializing each edge from its cached steering data. `None`
    /// when no goal-resident vertex exists.
    pub fn best_trajectory(&self) -> Option<Trajectory<F, N, M>> {
        let mut current = self.lower_bound_vertex?;
        let mut best = Trajectory::new();
        while let Some(parent) = self.vertices[current].parent {
            let edge = self.vertices[current].edge_from_parent.as_ref()?;
            let mut opt_data = edge.opt_data.clone();
            let mut leg = self.system.extend_to(
                self.vertices[parent].state(),
                self.vertices[current].state(),
                false,
                &mut opt_data,
            )?;
            leg.reverse();
            best.append(leg);
            current = parent;
        }
        best.reverse();
        Some(best)
    }

    /// Revalidates every edge against the current obstacle field and drops
    /// any subtree whose incoming edge no longer steers collision-free.
    /// Surviving vertices get recomputed costs and the best-vertex tracker
    /// is refreshed.
    ///
    /// Fails only when the root itself is in collision; the tree is left
    /// untouched in that case and the caller must re-initialize.
    pub fn check_tree(&mut self) -> Result<(), TreeRepairError> {
        if self.vertices.is_empty() {
            return Ok(());
        }
        if self.system.is_in_collision(self.vertices[Self::ROOT].state()) {
            warn!("tree repair impossible: root state is in collision");
            return Err(TreeRepairError::RootInCollision);
        }

        let mut doomed = 0usize;
        let mut stack = self.vertices[Self::ROOT].children.clone();
        while let Some(v) = stack.pop() {
            let parent = match self.vertices[v].parent {
                Some(parent) => parent,
                None => continue,
            };
            let survives = match self.vertices[v].edge_from_parent.as_ref() {
                Some(edge) => {
                    let mut opt_data = edge.opt_data.clone();
                    self.system
                        .extend_to(
                            self.vertices[parent].state(),
                            self.vertices[v].state(),
                            true,
                            &mut opt_data,
                        )
                        .is_some()
                }
                None => false,
            };
            if survives {
                stack.extend(self.vertices[v].children.iter().copied());
            } else {
                self.vertices[parent].remove_child(v);
                doomed += self.mark_subtree(v);
            }
        }

        if doomed > 0 {
            debug!("tree repair dropped {} vertices", doomed);
            self.retain_unmarked();
            self.update_all_costs();
        }

        debug_assert!(self.debug_check_tree_consistency());
        debug_assert!(self.debug_check_costs());
        debug_assert!(self.debug_check_index_coverage());
        debug_assert!(self.debug_check_best_vertex());
        Ok(())
    }

    /// Runs `check_tree` only when the committed trajectory is no longer
    /// safe under the current obstacle field. Returns whether a repair pass
    /// ran.
    pub fn lazy_check_tree(
        &mut self,
        committed: &Trajectory<F, N, M>,
    ) -> Result<bool, TreeRepairError> {
        if self.system.is_safe_trajectory(committed) {
            return Ok(false);
        }
        self.check_tree()?;
        Ok(true)
    }

    /// Advances the root along the current best trajectory by `distance`
    /// (measured as planar ground distance), appending the traversed states
    /// to `committed`, and discards everything outside the subtree beneath
    /// the new root.
    ///
    /// When the root is already in the goal, nothing is committed. When the
    /// whole best trajectory lies within the commitment horizon, the best
    /// vertex becomes the new root of a single-vertex tree.
    ///
    /// On any error other than [`SwitchRootError::NoBestVertex`] the tree
    /// is left in an indeterminate state and the caller must re-initialize.
    pub fn switch_root(
        &mut self,
        distance: F,
        committed: &mut Trajectory<F, N, M>,
    ) -> Result<(), SwitchRootError> {
        let best = self
            .lower_bound_vertex
            .ok_or(SwitchRootError::NoBestVertex)?;
        if self.system.is_in_goal(self.vertices[Self::ROOT].state()) {
            return Ok(());
        }

        // the root-to-best path, in order
        let mut path = Vec::new();
        let mut current = Some(best);
        while let Some(v) = current {
            path.push(v);
            current = self.vertices[v].parent;
        }
        path.reverse();

        // walk the path edge by edge until the commitment horizon falls
        // inside one of them
        let mut length = F::zero();
        let mut cut: Option<(RealVectorState<F, N>, usize)> = None;
        'edges: for &v in &path[1..] {
            let parent = match self.vertices[v].parent {
                Some(parent) => parent,
                None => continue,
            };
            let edge = self.vertices[v]
                .edge_from_parent
                .as_ref()
                .ok_or(SwitchRootError::EdgeReconstructionFailed)?;
            let mut opt_data = edge.opt_data.clone();
            let leg = self
                .system
                .extend_to(
                    self.vertices[parent].state(),
                    self.vertices[v].state(),
                    false,
                    &mut opt_data,
                )
                .ok_or(SwitchRootError::EdgeReconstructionFailed)?;

            if length + leg.total_variation < distance {
                length = length + leg.total_variation;
                committed.append(leg);
                continue;
            }

            // the horizon falls inside this edge: commit state by state
            // until the next step would cross it
            let mut previous = match leg.first_state() {
                Some(state) => *state,
                None => continue,
            };
            for (state, control) in leg.states.iter().zip(leg.controls.iter()).skip(1) {
                let step = previous.distance(state, true);
                previous = *state;
                if length + step < distance {
                    length = length + step;
                    committed.states.push(*state);
                    committed.controls.push(*control);
                    committed.total_variation = committed.total_variation + step;
                } else {
                    cut = Some((*state, v));
                    break 'edges;
                }
            }
        }

        match cut {
            None => {
                // the whole best trajectory fits in the horizon; restart
                // from the best state
                let new_root_state = *self.vertices[best].state();
                self.vertices.clear();
                self.index = NN::new();
                self.push_root(new_root_state);
                self.update_all_costs();
            }
            Some((new_root_state, first_child)) => {
                self.mark_subtree(first_child);

                // compact to {new root} ∪ marked subtree, remapping handles
                let old = std::mem::take(&mut self.vertices);
                let mut remap = vec![usize::MAX; old.len()];
                let mut survivors = Vec::with_capacity(old.len());
                survivors.push(Vertex::new(new_root_state, self.system.zero_cost()));
                for (handle, mut vertex) in old.into_iter().enumerate() {
                    if vertex.mark {
                        vertex.mark = false;
                        remap[handle] = survivors.len();
                        survivors.push(vertex);
                    }
                }
                for vertex in survivors.iter_mut().skip(1) {
                    vertex.parent = vertex
                        .parent
                        .and_then(|p| (remap[p] != usize::MAX).then_some(remap[p]));
                    vertex.children = vertex
                        .children
                        .iter()
                        .filter_map(|&c| (remap[c] != usize::MAX).then_some(remap[c]))
                        .collect();
                }
                self.vertices = survivors;
                self.index = NN::new();
                let new_child = remap[first_child];

                // the preserved subtree hangs off a freshly steered edge
                let child_state = *self.vertices[new_child].state();
                let mut opt_data = S::OptData::default();
                self.system
                    .extend_to(&new_root_state, &child_state, false, &mut opt_data)
                    .ok_or(SwitchRootError::NewRootEdgeExtendFailed)?;
                let edge_cost = self
                    .system
                    .evaluate_extend_cost(&new_root_state, &child_state, &mut opt_data)
                    .ok_or(SwitchRootError::NewRootEdgeCostFailed)?;
                self.vertices[new_child].parent = Some(Self::ROOT);
                self.vertices[new_child].cost_from_parent = edge_cost;
                self.vertices[new_child].edge_from_parent = Some(Edge {
                    cost: edge_cost,
                    opt_data,
                });
                self.vertices[Self::ROOT].add_child(new_child);

                for handle in 0..self.vertices.len() {
                    let key = self.system.key(self.vertices[handle].state());
                    self.index.add(key, handle);
                }
                self.update_all_costs();
            }
        }

        debug_assert!(self.debug_check_tree_consistency());
        debug_assert!(self.debug_check_costs());
        debug_assert!(self.debug_check_index_coverage());
        debug_assert!(self.debug_check_best_vertex());
        Ok(())
    }

    // Internals
    // ---------

    fn push_root(&mut self, state: RealVectorState<F, N>) {
        debug_assert!(self.vertices.is_empty());
        let key = self.system.key(&state);
        self.vertices
            .push(Vertex::new(state, self.system.zero_cost()));
        self.index.add(key, Self::ROOT);
    }

    /// Vertices within the shrinking RRT* radius of the sample, falling
    /// back to the single nearest vertex when the radius captures none.
    fn near_vertices(&self, sample: &RealVectorState<F, N>) -> Result<Vec<usize>, IterationError> {
        let key = self.system.key(sample);
        let count = F::from(self.vertices.len() + 1).unwrap();
        let dimension = F::from(N).unwrap();
        let radius = self.gamma * (count.ln() / count).powf(F::one() / dimension);

        let near = self.index.within_radius(&key, radius);
        if !near.is_empty() {
            return Ok(near);
        }
        match self.index.nearest_one(&key) {
            Some(nearest) => Ok(vec![nearest]),
            None => Err(IterationError::NearQueryEmpty),
        }
    }

    /// Evaluates the steering cost from every near vertex, then
    /// obstacle-checks candidates in order of increasing total cost. The
    /// first candidate that steers collision-free wins; its evaluated cost
    /// and steering cache are installed as the new edge.
    fn find_best_parent(
        &self,
        sample: &RealVectorState<F, N>,
        near: &[usize],
    ) -> Option<(usize, S::Cost, S::OptData)> {
        let mut candidates = Vec::with_capacity(near.len());
        for &v in near {
            let mut opt_data = S::OptData::default();
            let Some(edge_cost) =
                self.system
                    .evaluate_extend_cost(self.vertices[v].state(), sample, &mut opt_data)
            else {
                continue;
            };
            let through_cost = self.vertices[v].cost_from_root + edge_cost;
            candidates.push((v, edge_cost, opt_data, through_cost));
        }
        candidates.sort_by_key(|candidate| OrderedCost(candidate.3));

        for (v, edge_cost, mut opt_data, _) in candidates {
            if self
                .system
                .extend_to(self.vertices[v].state(), sample, true, &mut opt_data)
                .is_some()
            {
                return Some((v, edge_cost, opt_data));
            }
        }
        None
    }

    /// Creates the vertex and installs its edge, unless branch-and-bound
    /// rules the candidate out.
    fn insert_vertex(
        &mut self,
        parent: usize,
        state: RealVectorState<F, N>,
        edge_cost: S::Cost,
        opt_data: S::OptData,
    ) -> Option<usize> {
        let cost_from_root = self.vertices[parent].cost_from_root + edge_cost;
        if self.do_branch_and_bound && cost_from_root > self.lower_bound_cost {
            return None;
        }

        let handle = self.vertices.len();
        let key = self.system.key(&state);
        let mut vertex = Vertex::new(state, cost_from_root);
        vertex.parent = Some(parent);
        vertex.cost_from_parent = edge_cost;
        vertex.edge_from_parent = Some(Edge {
            cost: edge_cost,
            opt_data,
        });
        self.vertices.push(vertex);
        self.vertices[parent].add_child(handle);
        self.index.add(key, handle);
        self.update_best_vertex(handle);
        Some(handle)
    }

    /// Records `v` as the best vertex when it is goal-resident and cheaper
    /// than the current bound.
    fn update_best_vertex(&mut self, v: usize) {
        if !self.system.is_in_goal(self.vertices[v].state()) {
            return;
        }
        let cost = self.vertices[v].cost_from_root;
        if self.lower_bound_vertex.is_none() || cost < self.lower_bound_cost {
            self.lower_bound_cost = cost;
            self.lower_bound_vertex = Some(v);
        }
    }

    /// Re-parents any near vertex under `source` when routing through it
    /// is cheaper and steers collision-free, then pushes the improvement
    /// through the affected subtree.
    fn rewire_vertices(&mut self, source: usize, near: &[usize]) {
        let source_state = *self.vertices[source].state();
        for &w in near {
            if Some(w) == self.vertices[source].parent {
                continue;
            }
            let mut opt_data = S::OptData::default();
            let Some(edge_cost) = self.system.evaluate_extend_cost(
                &source_state,
                self.vertices[w].state(),
                &mut opt_data,
            ) else {
                continue;
            };
            let through_cost = self.vertices[source].cost_from_root + edge_cost;
            if !(through_cost < self.vertices[w].cost_from_root) {
                continue;
            }
            if self
                .system
                .extend_to(&source_state, self.vertices[w].state(), true, &mut opt_data)
                .is_none()
            {
                continue;
            }
            self.set_parent(
                w,
                source,
                edge_cost,
                Edge {
                    cost: edge_cost,
                    opt_data,
                },
            );
            self.propagate_branch_costs(w);
        }
    }

    /// Re-parents `child` under `parent`, replacing its incoming edge and
    /// refreshing its cost fields and the best-vertex tracker. The old edge
    /// is dropped with the assignment.
    fn set_parent(
        &mut self,
        child: usize,
        parent: usize,
        edge_cost: S::Cost,
        edge: Edge<S::Cost, S::OptData>,
    ) {
        if let Some(old_parent) = self.vertices[child].parent {
            self.vertices[old_parent].remove_child(child);
        }
        self.vertices[child].edge_from_parent = Some(edge);
        self.vertices[child].parent = Some(parent);
        self.vertices[child].cost_from_parent = edge_cost;
        self.vertices[child].cost_from_root = self.vertices[parent].cost_from_root + edge_cost;
        self.vertices[parent].add_child(child);
        self.update_best_vertex(child);
    }

    /// Recomputes `cost_from_root` below `start` with an explicit work
    /// stack, refreshing the best-vertex tracker for every touched vertex.
    /// Iterative on purpose: rewired subtrees can be deep enough to
    /// overflow the call stack.
    fn propagate_branch_costs(&mut self, start: usize) {
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            let children = self.vertices[v].children.clone();
            for child in children {
                self.vertices[child].cost_from_root =
                    self.vertices[v].cost_from_root + self.vertices[child].cost_from_parent;
                self.update_best_vertex(child);
                stack.push(child);
            }
        }
    }

    /// Rebuilds every `cost_from_root` in tree order from the root and
    /// re-derives the best vertex from scratch.
    fn update_all_costs(&mut self) {
        self.lower_bound_cost = self.system.inf_cost();
        self.lower_bound_vertex = None;
        if self.vertices.is_empty() {
            return;
        }
        self.update_best_vertex(Self::ROOT);
        self.propagate_branch_costs(Self::ROOT);
    }

    /// Marks `start` and all of its descendants; returns how many were
    /// marked.
    fn mark_subtree(&mut self, start: usize) -> usize {
        let mut marked = 0;
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            self.vertices[v].mark = true;
            marked += 1;
            stack.extend(self.vertices[v].children.iter().copied());
        }
        marked
    }

    /// Drops every marked vertex, compacts the arena, remaps all stored
    /// handles, and rebuilds the spatial index over the survivors.
    fn retain_unmarked(&mut self) {
        let old = std::mem::take(&mut self.vertices);
        let mut remap = vec![usize::MAX; old.len()];
        let mut survivors = Vec::with_capacity(old.len());
        for (handle, vertex) in old.into_iter().enumerate() {
            if !vertex.mark {
                remap[handle] = survivors.len();
                survivors.push(vertex);
            }
        }
        for vertex in survivors.iter_mut() {
            vertex.parent = vertex
                .parent
                .and_then(|p| (remap[p] != usize::MAX).then_some(remap[p]));
            vertex.children = vertex
                .children
                .iter()
                .filter_map(|&c| (remap[c] != usize::MAX).then_some(remap[c]))
                .collect();
        }
        self.vertices = survivors;
        self.lower_bound_vertex = None;
        self.lower_bound_cost = self.system.inf_cost();

        self.index = NN::new();
        for handle in 0..self.vertices.len() {
            let key = self.system.key(self.vertices[handle].state());
            self.index.add(key, handle);
        }
    }

    // Debugging assertion functions
    // -----------------------------

    /// Checks parent/child bijection and the absence of cycles, and that
    /// exactly one vertex (the root) is parentless.
    fn debug_check_tree_consistency(&self) -> bool {
        let mut parentless = 0;
        for (handle, vertex) in self.vertices.iter().enumerate() {
            match vertex.parent {
                None => parentless += 1,
                Some(parent) => {
                    if !self.vertices[parent].children.contains(&handle) {
                        println!(
                            "parent inconsistency: vertex {} has parent {} but is not its child",
                            handle, parent
                        );
                        return false;
                    }
                    if vertex.edge_from_parent.is_none() {
                        println!("vertex {} has a parent but no edge", handle);
                        return false;
                    }
                }
            }
            for &child in &vertex.children {
                if self.vertices[child].parent != Some(handle) {
                    println!(
                        "child inconsistency: vertex {} lists child {} with parent {:?}",
                        handle, child, self.vertices[child].parent
                    );
                    return false;
                }
            }
            let mut steps = 0;
            let mut current = handle;
            while let Some(parent) = self.vertices[current].parent {
                steps += 1;
                if steps > self.vertices.len() {
                    println!("cycle detected through vertex {}", handle);
                    return false;
                }
                current = parent;
            }
            if vertex.mark {
                println!("vertex {} still carries a sweep mark", handle);
                return false;
            }
        }
        self.vertices.is_empty() || parentless == 1
    }

    /// Checks that every vertex's `cost_from_root` is its parent's plus its
    /// own edge cost, and that the cached edge cost matches.
    fn debug_check_costs(&self) -> bool {
        use std::cmp::Ordering;
        for (handle, vertex) in self.vertices.iter().enumerate() {
            let Some(parent) = vertex.parent else {
                continue;
            };
            let expected = self.vertices[parent].cost_from_root + vertex.cost_from_parent;
            if vertex.cost_from_root.partial_cmp(&expected) != Some(Ordering::Equal) {
                println!("cost_from_root mismatch at vertex {}", handle);
                return false;
            }
            match vertex.edge_from_parent.as_ref() {
                Some(edge)
                    if edge.cost.partial_cmp(&vertex.cost_from_parent)
                        == Some(Ordering::Equal) => {}
                _ => {
                    println!("edge cost mismatch at vertex {}", handle);
                    return false;
                }
            }
        }
        true
    }

    /// Checks that the index holds exactly one entry per live vertex.
    fn debug_check_index_coverage(&self) -> bool {
        if self.index.len() != self.vertices.len() {
            println!(
                "index holds {} entries for {} vertices",
                self.index.len(),
                self.vertices.len()
            );
            return false;
        }
        true
    }

    /// Checks that the best vertex, when set, is goal-resident and minimal
    /// among goal-resident vertices.
    fn debug_check_best_vertex(&self) -> bool {
        use std::cmp::Ordering;
        let Some(best) = self.lower_bound_vertex else {
            return true;
        };
        if !self.system.is_in_goal(self.vertices[best].state()) {
            println!("best vertex {} is not goal-resident", best);
            return false;
        }
        if self.vertices[best]
            .cost_from_root
            .partial_cmp(&self.lower_bound_cost)
            != Some(Ordering::Equal)
        {
            println!("best cost does not match best vertex {}", best);
            return false;
        }
        for (handle, vertex) in self.vertices.iter().enumerate() {
            if self.system.is_in_goal(vertex.state())
                && vertex.cost_from_root < self.lower_bound_cost
            {
                println!("vertex {} beats the recorded best vertex {}", handle, best);
                return false;
            }
        }
        true
    }
}

/// Computes the gamma value that achieves asymptotic optimality for RRT*
/// in a free space of the given volume and dimension.
///
/// Panics when `free_space_volume` or `dimension` is not positive; both are
/// preconditions of the formula.
pub fn optimal_gamma(free_space_volume: f32, dimension: usize) -> f32 {
    if free_space_volume <= 0.0 {
        panic!("The free space volume must be positive.");
    }
    if dimension == 0 {
        panic!("The dimension must be positive.");
    }

    let unit_ball_volume = (std::f32::consts::PI.powf((dimension as f32) / 2.0))
        / special::Gamma::gamma(1.0 + (dimension as f32) / 2.0);

    (2.0 * (1.0 + 1.0 / dimension as f32) * free_space_volume / unit_ball_volume)
        .powf(1.0 / dimension as f32)
}

#[cfg(test)]
mod tests {
    use super::{optimal_gamma, PlannerConfig, RrtStar};
    use crate::obstacles::{AnalyticObstacle, SphericalObstacle};
    use crate::planner::error::{IterationError, TreeRepairError};
    use crate::planner::neighbors::LinearNearestNeighbors;
    use crate::system::{RealVectorState, System, Trajectory};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// A holonomic point robot steered along straight lines; the minimal
    /// system exercising the kernel independently of the Dubins model.
    struct LineSystem {
        bounds: [(f32, f32); 2],
        goal_center: RealVectorState<f32, 2>,
        goal_radius: f32,
        obstacles: Vec<SphericalObstacle<f32, 2>>,
        step: f32,
        rng: StdRng,
    }

    impl LineSystem {
        fn free_space(seed: u64) -> Self {
            Self {
                bounds: [(0.0, 10.0), (0.0, 10.0)],
                goal_center: RealVectorState::new([9.0, 9.0]),
                goal_radius: 0.5,
                obstacles: Vec::new(),
                step: 0.25,
                rng: StdRng::seed_from_u64(seed),
            }
        }
    }

    impl System<f32, 2, 1> for LineSystem {
        type OptData = ();
        type Cost = f32;

        fn sample_state(&mut self) -> Option<RealVectorState<f32, 2>> {
            Some(RealVectorState::new([
                self.rng.gen_range(self.bounds[0].0..self.bounds[0].1),
                self.rng.gen_range(self.bounds[1].0..self.bounds[1].1),
            ]))
        }

        fn sample_in_goal(&mut self) -> Option<RealVectorState<f32, 2>> {
            let radius = self.goal_radius * self.rng.gen_range(0.0f32..1.0).sqrt();
            let angle = self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            Some(RealVectorState::new([
                self.goal_center[0] + radius * angle.cos(),
                self.goal_center[1] + radius * angle.sin(),
            ]))
        }

        fn is_in_goal(&self, state: &RealVectorState<f32, 2>) -> bool {
            state.euclidean_distance(&self.goal_center) < self.goal_radius
        }

        fn is_in_collision(&self, state: &RealVectorState<f32, 2>) -> bool {
            self.obstacles.iter().any(|o| o.contains(state))
        }

        fn key(&self, state: &RealVectorState<f32, 2>) -> [f32; 2] {
            *state.values()
        }

        fn evaluate_extend_cost(
            &self,
            start: &RealVectorState<f32, 2>,
            end: &RealVectorState<f32, 2>,
            _opt_data: &mut (),
        ) -> Option<f32> {
            Some(start.euclidean_distance(end))
        }

        fn extend_to(
            &self,
            start: &RealVectorState<f32, 2>,
            end: &RealVectorState<f32, 2>,
            check_obstacles: bool,
            _opt_data: &mut (),
        ) -> Option<Trajectory<f32, 2, 1>> {
            let distance = start.euclidean_distance(end);
            let mut traj = Trajectory::new();
            traj.total_variation = distance;
            let mut travelled = 0.0f32;
            while travelled < distance {
                travelled += self.step;
                if travelled > distance {
                    travelled = distance;
                }
                let t = travelled / distance;
                let state = *start + (*end - *start) * t;
                traj.push(state, RealVectorState::new([0.0]));
            }
            if check_obstacles && !self.is_safe_trajectory(&traj) {
                return None;
            }
            Some(traj)
        }

        fn is_safe_trajectory(&self, trajectory: &Trajectory<f32, 2, 1>) -> bool {
            trajectory.states.iter().all(|s| !self.is_in_collision(s))
        }

        fn zero_cost(&self) -> f32 {
            0.0
        }

        fn inf_cost(&self) -> f32 {
            f32::INFINITY
        }
    }

    type Planner = RrtStar<f32, 2, 1, LineSystem, LinearNearestNeighbors<f32, 2>>;

    fn planner(seed: u64) -> Planner {
        let mut planner = RrtStar::new(
            LineSystem::free_space(seed),
            PlannerConfig {
                seed,
                ..PlannerConfig::default()
            },
        );
        planner.initialize(RealVectorState::new([1.0, 1.0]), true);
        planner
    }

    #[test]
    fn iteration_before_initialize_reports_an_empty_tree() {
        let mut uninitialized: Planner =
            RrtStar::new(LineSystem::free_space(1), PlannerConfig::default());
        assert_eq!(
            uninitialized.iteration().unwrap_err(),
            IterationError::NearQueryEmpty
        );
    }

    #[test]
    fn tree_grows_and_the_bound_is_monotone() {
        let mut planner = planner(2);
        let mut previous = f32::INFINITY;
        for _ in 0..600 {
            let _ = planner.iteration();
            let cost = planner.best_cost();
            assert!(cost <= previous);
            previous = cost;
        }
        assert!(planner.num_vertices() > 100);
        assert!(planner.best_vertex().is_some());
        assert!(planner.debug_check_tree_consistency());
        assert!(planner.debug_check_costs());
        assert!(planner.debug_check_index_coverage());
        assert!(planner.debug_check_best_vertex());

        // the straight-line optimum is a lower bound on the best cost
        let optimum = RealVectorState::new([1.0f32, 1.0])
            .euclidean_distance(&RealVectorState::new([9.0, 9.0]))
            - 0.5;
        assert!(planner.best_cost() >= optimum - 1e-3);
        assert!(planner.best_cost() < optimum + 2.0);
    }

    #[test]
    fn best_trajectory_runs_from_root_to_best_vertex() {
        let mut planner = planner(3);
        for _ in 0..400 {
            let _ = planner.iteration();
        }
        let best = planner.best_vertex().expect("goal must be reached");
        let traj = planner.best_trajectory().expect("trajectory must exist");
        assert!(!traj.is_empty());

        let root = *planner.root().unwrap().state();
        let first = traj.first_state().unwrap();
        assert!(first.euclidean_distance(&root) <= 0.3);
        let last = traj.last_state().unwrap();
        assert!(last.euclidean_distance(planner.vertices()[best].state()) < 1e-4);
    }

    #[test]
    fn branch_and_bound_prunes_once_a_bound_exists() {
        let mut planner = planner(4);
        let mut pruned = 0;
        for _ in 0..600 {
            if planner.iteration() == Err(IterationError::PrunedByBound) {
                pruned += 1;
            }
        }
        assert!(planner.best_vertex().is_some());
        assert!(pruned > 0, "no insert was ever pruned by the bound");
    }

    #[test]
    fn check_tree_removes_blocked_subtrees() {
        let mut planner = planner(5);
        for _ in 0..500 {
            let _ = planner.iteration();
        }
        let before = planner.num_vertices();

        planner
            .system_mut()
            .obstacles
            .push(SphericalObstacle::new(RealVectorState::new([5.0, 5.0]), 1.5));
        planner.check_tree().expect("root is collision-free");

        assert!(planner.num_vertices() < before);
        for vertex in planner.vertices() {
            assert!(!planner.system().is_in_collision(vertex.state()));
        }
        assert!(planner.debug_check_tree_consistency());
        assert!(planner.debug_check_costs());
        assert!(planner.debug_check_index_coverage());
        assert!(planner.debug_check_best_vertex());
    }

    #[test]
    fn check_tree_fails_when_the_root_is_swallowed() {
        let mut planner = planner(6);
        for _ in 0..50 {
            let _ = planner.iteration();
        }
        planner
            .system_mut()
            .obstacles
            .push(SphericalObstacle::new(RealVectorState::new([1.0, 1.0]), 0.5));
        assert_eq!(
            planner.check_tree().unwrap_err(),
            TreeRepairError::RootInCollision
        );
    }

    #[test]
    fn lazy_check_skips_repair_while_the_commitment_is_safe() {
        let mut planner = planner(7);
        for _ in 0..300 {
            let _ = planner.iteration();
        }
        let committed = planner.best_trajectory().expect("goal must be reached");
        assert_eq!(planner.lazy_check_tree(&committed), Ok(false));

        let mid = committed.states[committed.len() / 2];
        planner
            .system_mut()
            .obstacles
            .push(SphericalObstacle::new(mid, 0.6));
        assert_eq!(planner.lazy_check_tree(&committed), Ok(true));
    }

    #[test]
    fn switch_root_commits_the_requested_length() {
        let mut planner = planner(8);
        for _ in 0..600 {
            let _ = planner.iteration();
        }
        let before = planner.best_cost();

        let mut committed = Trajectory::new();
        planner.switch_root(2.0, &mut committed).unwrap();

        assert!(committed.total_variation <= 2.0);
        assert!(committed.total_variation > 2.0 - 2.0 * 0.25);
        let tail = committed.last_state().expect("something was committed");
        let root = planner.root().unwrap().state();
        assert!(root.euclidean_distance(tail) <= 2.0 * 0.25);

        assert!(planner.best_vertex().is_some());
        let decrease = before - planner.best_cost();
        assert!((decrease - 2.0).abs() < 1.0, "cost dropped by {}", decrease);
        assert!(planner.debug_check_tree_consistency());
        assert!(planner.debug_check_costs());
        assert!(planner.debug_check_index_coverage());
        assert!(planner.debug_check_best_vertex());
    }

    #[test]
    fn switch_root_past_the_goal_restarts_from_the_best_state() {
        let mut planner = planner(9);
        for _ in 0..600 {
            let _ = planner.iteration();
        }
        let best_state = *planner.vertices()[planner.best_vertex().unwrap()].state();

        let mut committed = Trajectory::new();
        planner.switch_root(1000.0, &mut committed).unwrap();

        assert_eq!(planner.num_vertices(), 1);
        let root = planner.root().unwrap().state();
        assert!(root.euclidean_distance(&best_state) < 1e-4);
        // the fresh root sits in the goal, so it is also the best vertex
        assert_eq!(planner.best_vertex(), Some(0));
    }

    #[test]
    fn optimal_gamma_matches_the_planar_closed_form() {
        let gamma = optimal_gamma(100.0, 2);
        let expected = (2.0f32 * 1.5 * 100.0 / std::f32::consts::PI).sqrt();
        assert!((gamma - expected).abs() < 1e-4);
    }
}
