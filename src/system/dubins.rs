use crate::obstacles::ValidityChecker;
use crate::system::{RealVectorState, System, Trajectory};
use num_traits::{Float, FloatConst};
use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Per-edge cache for the Dubins model: the index into the candidate
/// turning-radius set that produced the best connection. `None` means the
/// connection has not been evaluated yet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DubinsOptData {
    pub radius_index: Option<usize>,
}

/// A planar disk goal region; headings are unconstrained inside it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalRegion<F: Float> {
    pub center: RealVectorState<F, 2>,
    pub radius: F,
}

/// A Dubins vehicle: state `(x, y, θ)`, control the signed turning radius
/// (zero on straight segments), forward-only motion.
///
/// Steering between two configurations picks the cheapest of the four
/// circle-tangent-circle combinations (LR, RL, LL, RR) over a fixed set of
/// candidate turning radii. Obstacles live in the plane; collision checks
/// project the state onto `(x, y)`.
pub struct Dubins<F: Float + FloatConst> {
    turning_radii: Vec<F>,
    delta_distance: F,
    bounds: [(F, F); 2],
    goal: GoalRegion<F>,
    validity_checker: Box<dyn ValidityChecker<F, 2>>,
    rng: StdRng,
}

/// Wraps an angle to `[0, 2π)`.
fn wrap_zero_two_pi<F: Float + FloatConst>(theta: F) -> F {
    let two_pi = F::PI() + F::PI();
    let wrapped = theta % two_pi;
    if wrapped < F::zero() {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Wraps an angle to `[-π, π)`.
fn wrap_minus_pi_pi<F: Float + FloatConst>(theta: F) -> F {
    let two_pi = F::PI() + F::PI();
    let wrapped = theta % two_pi;
    if wrapped < -F::PI() {
        wrapped + two_pi
    } else if wrapped >= F::PI() {
        wrapped - two_pi
    } else {
        wrapped
    }
}

impl<F: Float + FloatConst + SampleUniform> Dubins<F> {
    /// Creates a Dubins system sampling `(x, y)` uniformly from `bounds`
    /// and headings uniformly from `[-π, π)`, with the default candidate
    /// turning radius 3.5 and discretization step 0.05.
    pub fn new(
        bounds: [(F, F); 2],
        goal: GoalRegion<F>,
        validity_checker: Box<dyn ValidityChecker<F, 2>>,
        seed: u64,
    ) -> Self {
        Self {
            turning_radii: vec![F::from(3.5).unwrap()],
            delta_distance: F::from(0.05).unwrap(),
            bounds,
            goal,
            validity_checker,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replaces the candidate turning-radius set. Cached
    /// [`DubinsOptData`] from earlier evaluations is invalidated by this.
    pub fn set_turning_radii(&mut self, turning_radii: Vec<F>) {
        self.turning_radii = turning_radii;
    }

    pub fn set_delta_distance(&mut self, delta_distance: F) {
        self.delta_distance = delta_distance;
    }

    /// Swaps the obstacle field. Used for online replanning when the
    /// environment changes between planner operations.
    pub fn set_validity_checker(&mut self, validity_checker: Box<dyn ValidityChecker<F, 2>>) {
        self.validity_checker = validity_checker;
    }

    pub fn goal(&self) -> &GoalRegion<F> {
        &self.goal
    }

    fn planar(state: &RealVectorState<F, 3>) -> RealVectorState<F, 2> {
        RealVectorState::new([state[0], state[1]])
    }

    /// Connects two turning circles with one of the four tangent
    /// combinations (1 = LR, 2 = RL, 3 = LL, 4 = RR). `s1` and `s2` carry
    /// the circle anchor point and the heading the vehicle holds there.
    /// Returns the path length, or `None` when this combination has no
    /// solution; fills `traj` when given.
    fn extend_dubins_spheres(
        &self,
        s1: [F; 3],
        s2: [F; 3],
        combination: usize,
        turning_radius: F,
        traj: Option<&mut Trajectory<F, 3, 1>>,
    ) -> Option<F> {
        let one = F::one();
        let two = F::from(2.0).unwrap();
        let three_half_pi = F::PI() + F::FRAC_PI_2();

        let (x_s1, y_s1, t_s1) = (s1[0], s1[1], s1[2]);
        let (x_s2, y_s2, t_s2) = (s2[0], s2[1], s2[2]);
        let x_tr = x_s2 - x_s1;
        let y_tr = y_s2 - y_s1;
        let t_tr = y_tr.atan2(x_tr);
        let distance = (x_tr * x_tr + y_tr * y_tr).sqrt();

        let (t_start, t_end) = if distance > two * turning_radius {
            // disks do not intersect
            let t_balls = (two * turning_radius / distance).acos();
            match combination {
                1 => (t_tr - t_balls, t_tr + F::PI() - t_balls),
                2 => (t_tr + t_balls, t_tr - F::PI() + t_balls),
                3 => (t_tr - F::FRAC_PI_2(), t_tr - F::FRAC_PI_2()),
                4 => (t_tr + F::FRAC_PI_2(), t_tr + F::FRAC_PI_2()),
                _ => return None,
            }
        } else {
            // disks intersect; the inner tangents of combinations 1 and 2
            // no longer exist
            match combination {
                3 => (t_tr - F::FRAC_PI_2(), t_tr - F::FRAC_PI_2()),
                4 => (t_tr + F::FRAC_PI_2(), t_tr + F::FRAC_PI_2()),
                _ => return None,
            }
        };

        let x_start = x_s1 + turning_radius * t_start.cos();
        let y_start = y_s1 + turning_radius * t_start.sin();
        let x_end = x_s2 + turning_radius * t_end.cos();
        let y_end = y_s2 + turning_radius * t_end.sin();

        let direction_s1 = if combination == 2 || combination == 4 {
            -one
        } else {
            one
        };
        let direction_s2 = if combination == 1 || combination == 4 {
            -one
        } else {
            one
        };

        let t_increment_s1 = wrap_zero_two_pi(direction_s1 * (t_start - t_s1));
        let t_increment_s2 = wrap_zero_two_pi(direction_s2 * (t_s2 - t_end));

        if (t_increment_s1 > F::PI() && t_increment_s2 > F::PI())
            || t_increment_s1 > three_half_pi
            || t_increment_s2 > three_half_pi
        {
            return None;
        }

        let turn_s1 = wrap_minus_pi_pi(t_increment_s1);
        let turn_s2 = wrap_minus_pi_pi(t_increment_s2);
        let total_cost = (turn_s1.abs() + turn_s2.abs()) * turning_radius + distance;

        if let Some(traj) = traj {
            traj.clear();
            traj.total_variation = total_cost;

            let del_d = self.delta_distance;
            let del_t = del_d / turning_radius;
            let heading_offset_s1 = if direction_s1 == one {
                F::FRAC_PI_2()
            } else {
                three_half_pi
            };
            let heading_offset_s2 = if direction_s2 == one {
                F::FRAC_PI_2()
            } else {
                three_half_pi
            };

            // arc on the first circle
            let mut t_inc_curr = F::zero();
            while t_inc_curr < t_increment_s1 {
                t_inc_curr = t_inc_curr + del_t;
                if t_inc_curr > t_increment_s1 {
                    t_inc_curr = t_increment_s1;
                }
                let angle = direction_s1 * t_inc_curr + t_s1;
                traj.push(
                    RealVectorState::new([
                        x_s1 + turning_radius * angle.cos(),
                        y_s1 + turning_radius * angle.sin(),
                        wrap_minus_pi_pi(angle + heading_offset_s1),
                    ]),
                    RealVectorState::new([direction_s1 * turning_radius]),
                );
            }

            // straight tangent segment; heading is frozen at the exit of
            // the first arc
            let straight_heading =
                wrap_minus_pi_pi(direction_s1 * t_inc_curr + t_s1 + heading_offset_s1);
            let mut d_inc_curr = F::zero();
            while d_inc_curr < distance {
                d_inc_curr = d_inc_curr + del_d;
                if d_inc_curr > distance {
                    d_inc_curr = distance;
                }
                traj.push(
                    RealVectorState::new([
                        (x_end - x_start) * d_inc_curr / distance + x_start,
                        (y_end - y_start) * d_inc_curr / distance + y_start,
                        straight_heading,
                    ]),
                    RealVectorState::new([F::zero()]),
                );
            }

            // arc on the second circle
            let mut t_inc_curr = F::zero();
            while t_inc_curr < t_increment_s2 {
                t_inc_curr = t_inc_curr + del_t;
                if t_inc_curr > t_increment_s2 {
                    t_inc_curr = t_increment_s2;
                }
                let angle = direction_s2 * (t_inc_curr - t_increment_s2) + t_s2;
                traj.push(
                    RealVectorState::new([
                        x_s2 + turning_radius * angle.cos(),
                        y_s2 + turning_radius * angle.sin(),
                        wrap_minus_pi_pi(angle + heading_offset_s2),
                    ]),
                    RealVectorState::new([direction_s2 * turning_radius]),
                );
            }
        }

        Some(total_cost)
    }

    /// Evaluates all four tangent combinations between `start` and `end`
    /// for one turning radius and returns the minimum path length;
    /// materializes the winning combination into `traj` when given.
    fn extend_dubins_all(
        &self,
        start: &RealVectorState<F, 3>,
        end: &RealVectorState<F, 3>,
        turning_radius: F,
        traj: Option<&mut Trajectory<F, 3, 1>>,
    ) -> Option<F> {
        let three_half_pi = F::PI() + F::FRAC_PI_2();
        let ti = start[2];
        let tf = end[2];
        let sin_ti = (-ti).sin();
        let cos_ti = (-ti).cos();
        let sin_tf = (-tf).sin();
        let cos_tf = (-tf).cos();

        let si_left = [
            start[0] + turning_radius * sin_ti,
            start[1] + turning_radius * cos_ti,
            ti + three_half_pi,
        ];
        let si_right = [
            start[0] - turning_radius * sin_ti,
            start[1] - turning_radius * cos_ti,
            ti + F::FRAC_PI_2(),
        ];
        let sf_left = [
            end[0] + turning_radius * sin_tf,
            end[1] + turning_radius * cos_tf,
            tf + three_half_pi,
        ];
        let sf_right = [
            end[0] - turning_radius * sin_tf,
            end[1] - turning_radius * cos_tf,
            tf + F::FRAC_PI_2(),
        ];

        let combinations = [
            (si_left, sf_right),
            (si_right, sf_left),
            (si_left, sf_left),
            (si_right, sf_right),
        ];

        let mut best: Option<(usize, F)> = None;
        for (i, (s1, s2)) in combinations.iter().enumerate() {
            if let Some(cost) = self.extend_dubins_spheres(*s1, *s2, i + 1, turning_radius, None) {
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((i + 1, cost));
                }
            }
        }

        let (combination, cost) = best?;
        if let Some(traj) = traj {
            let (s1, s2) = combinations[combination - 1];
            self.extend_dubins_spheres(s1, s2, combination, turning_radius, Some(traj))?;
        }
        Some(cost)
    }
}

impl<F: Float + FloatConst + SampleUniform> System<F, 3, 1> for Dubins<F> {
    type OptData = DubinsOptData;
    type Cost = F;

    fn sample_state(&mut self) -> Option<RealVectorState<F, 3>> {
        let x = self.rng.gen_range(self.bounds[0].0..self.bounds[0].1);
        let y = self.rng.gen_range(self.bounds[1].0..self.bounds[1].1);
        let heading = self.rng.gen_range(-F::PI()..F::PI());
        Some(RealVectorState::new([x, y, heading]))
    }

    fn sample_in_goal(&mut self) -> Option<RealVectorState<F, 3>> {
        // area-uniform draw over the goal disk
        let unit: F = self.rng.gen_range(F::zero()..F::one());
        let radius = self.goal.radius * unit.sqrt();
        let angle = self.rng.gen_range(-F::PI()..F::PI());
        let heading = self.rng.gen_range(-F::PI()..F::PI());
        Some(RealVectorState::new([
            self.goal.center[0] + radius * angle.cos(),
            self.goal.center[1] + radius * angle.sin(),
            heading,
        ]))
    }

    fn is_in_goal(&self, state: &RealVectorState<F, 3>) -> bool {
        Self::planar(state).euclidean_distance(&self.goal.center) < self.goal.radius
    }

    fn is_in_collision(&self, state: &RealVectorState<F, 3>) -> bool {
        !self.validity_checker.is_state_valid(&Self::planar(state))
    }

    fn key(&self, state: &RealVectorState<F, 3>) -> [F; 3] {
        *state.values()
    }

    fn evaluate_extend_cost(
        &self,
        start: &RealVectorState<F, 3>,
        end: &RealVectorState<F, 3>,
        opt_data: &mut DubinsOptData,
    ) -> Option<F> {
        if let Some(index) = opt_data.radius_index {
            let turning_radius = *self.turning_radii.get(index)?;
            return self.extend_dubins_all(start, end, turning_radius, None);
        }

        let mut best: Option<(usize, F)> = None;
        for (index, &turning_radius) in self.turning_radii.iter().enumerate().rev() {
            if let Some(cost) = self.extend_dubins_all(start, end, turning_radius, None) {
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((index, cost));
                }
            }
        }
        let (index, cost) = best?;
        opt_data.radius_index = Some(index);
        Some(cost)
    }

    fn extend_to(
        &self,
        start: &RealVectorState<F, 3>,
        end: &RealVectorState<F, 3>,
        check_obstacles: bool,
        opt_data: &mut DubinsOptData,
    ) -> Option<Trajectory<F, 3, 1>> {
        if opt_data.radius_index.is_none() {
            self.evaluate_extend_cost(start, end, opt_data)?;
        }
        let turning_radius = *self.turning_radii.get(opt_data.radius_index?)?;

        let mut traj = Trajectory::new();
        self.extend_dubins_all(start, end, turning_radius, Some(&mut traj))?;
        if check_obstacles && !self.is_safe_trajectory(&traj) {
            return None;
        }
        Some(traj)
    }

    fn is_safe_trajectory(&self, trajectory: &Trajectory<F, 3, 1>) -> bool {
        trajectory
            .states
            .iter()
            .all(|state| !self.is_in_collision(state))
    }

    fn zero_cost(&self) -> F {
        F::zero()
    }

    fn inf_cost(&self) -> F {
        F::infinity()
    }
}

#[cfg(test)]
mod tests {
    use super::{wrap_minus_pi_pi, wrap_zero_two_pi, Dubins, DubinsOptData, GoalRegion};
    use crate::obstacles::AlwaysValid;
    use crate::system::{RealVectorState, System};
    use std::f32::consts::PI;

    fn free_space_dubins() -> Dubins<f32> {
        Dubins::new(
            [(0.0, 20.0), (0.0, 20.0)],
            GoalRegion {
                center: RealVectorState::new([18.0, 18.0]),
                radius: 1.0,
            },
            Box::new(AlwaysValid::new()),
            42,
        )
    }

    #[test]
    fn angle_wrapping() {
        assert!((wrap_zero_two_pi(-0.5f32) - (2.0 * PI - 0.5)).abs() < 1e-5);
        assert!(wrap_zero_two_pi(2.0 * PI).abs() < 1e-5);
        assert!((wrap_minus_pi_pi(1.5f32 * PI) + 0.5 * PI).abs() < 1e-5);
        assert!((wrap_minus_pi_pi(PI) + PI).abs() < 1e-5);
    }

    #[test]
    fn straight_shot_costs_the_distance() {
        let dubins = free_space_dubins();
        let si = RealVectorState::new([0.0, 0.0, 0.0]);
        let sf = RealVectorState::new([10.0, 0.0, 0.0]);
        let mut opt_data = DubinsOptData::default();
        let cost = dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).unwrap();
        assert!((cost - 10.0).abs() < 1e-3, "cost {cost}");
        assert_eq!(opt_data.radius_index, Some(0));

        let traj = dubins.extend_to(&si, &sf, true, &mut opt_data).unwrap();
        assert!((traj.total_variation - 10.0).abs() < 1e-3);
        for state in &traj.states {
            assert!(state[1].abs() < 1e-4, "y drifted to {}", state[1]);
            assert!(state[2].abs() < 1e-4, "heading drifted to {}", state[2]);
        }
        let last = traj.last_state().unwrap();
        assert!((last[0] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn wide_u_turn_is_two_quarter_arcs_and_a_straight() {
        // quarter arc left, 3 units straight up, quarter arc left:
        // cost = (π/2 + π/2) * 3.5 + 3
        let dubins = free_space_dubins();
        let si = RealVectorState::new([0.0, 0.0, 0.0]);
        let sf = RealVectorState::new([0.0, 10.0, PI]);
        let mut opt_data = DubinsOptData::default();
        let cost = dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).unwrap();
        assert!((cost - (PI * 3.5 + 3.0)).abs() < 1e-2, "cost {cost}");

        let traj = dubins.extend_to(&si, &sf, false, &mut opt_data).unwrap();
        let last = traj.last_state().unwrap();
        assert!(last.distance(&sf, true) < 1e-2);
        // the maneuver never swings wider than the turning circles
        for state in &traj.states {
            assert!(state[0] <= 3.5 + 1e-3, "x overshot to {}", state[0]);
            assert!(state[0] >= -1e-3);
        }
    }

    #[test]
    fn antipodal_headings_at_same_point_are_unreachable() {
        // every tangent family needs a turn beyond the feasibility caps here
        let dubins = free_space_dubins();
        let si = RealVectorState::new([0.0, 0.0, 0.0]);
        let sf = RealVectorState::new([0.0, 0.0, PI]);
        let mut opt_data = DubinsOptData::default();
        assert!(dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).is_none());
    }

    #[test]
    fn intersecting_disks_reject_inner_tangents_only() {
        let dubins = free_space_dubins();
        // circle anchors closer than one diameter: combinations 1 and 2
        // have no solution
        let s1 = [0.0f32, 0.0, 0.0];
        let s2 = [3.5f32, 0.0, 0.0];
        assert!(dubins.extend_dubins_spheres(s1, s2, 1, 3.5, None).is_none());
        assert!(dubins.extend_dubins_spheres(s1, s2, 2, 3.5, None).is_none());

        // the full query still connects through the outer tangents
        let si = RealVectorState::new([0.0, 0.0, 0.0]);
        let sf = RealVectorState::new([3.5, 0.0, 0.0]);
        let mut opt_data = DubinsOptData::default();
        let cost = dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).unwrap();
        assert!((cost - 3.5).abs() < 1e-3, "cost {cost}");
    }

    #[test]
    fn cached_opt_data_reproduces_the_cost() {
        let dubins = free_space_dubins();
        let si = RealVectorState::new([1.0, 2.0, 0.3]);
        let sf = RealVectorState::new([12.0, 9.0, -1.1]);
        let mut opt_data = DubinsOptData::default();
        let first = dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).unwrap();
        let second = dubins.evaluate_extend_cost(&si, &sf, &mut opt_data).unwrap();
        assert!((first - second).abs() < 1e-5);

        let traj = dubins.extend_to(&si, &sf, false, &mut opt_data).unwrap();
        assert!((traj.total_variation - first).abs() < 1e-3);
    }

    #[test]
    fn extend_to_rejects_colliding_trajectories() {
        use crate::obstacles::{AnalyticValidityChecker, SphericalObstacle};
        let mut dubins = free_space_dubins();
        dubins.set_validity_checker(Box::new(AnalyticValidityChecker::new(vec![
            SphericalObstacle::new(RealVectorState::new([5.0, 0.0]), 1.0),
        ])));
        let si = RealVectorState::new([0.0, 0.0, 0.0]);
        let sf = RealVectorState::new([10.0, 0.0, 0.0]);
        let mut opt_data = DubinsOptData::default();
        assert!(dubins.extend_to(&si, &sf, true, &mut opt_data).is_none());
        // without obstacle checking the same edge materializes
        assert!(dubins.extend_to(&si, &sf, false, &mut opt_data).is_some());
    }

    #[test]
    fn goal_samples_land_in_the_goal_disk() {
        let mut dubins = free_space_dubins();
        for _ in 0..100 {
            let sample = dubins.sample_in_goal().unwrap();
            assert!(dubins.is_in_goal(&sample));
        }
    }
}
