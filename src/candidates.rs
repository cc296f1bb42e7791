//! C3: the precomputed candidate direction grid and its goal-relative
//! ranking. Generalizes `src/motion/junction.rs`'s dot-product angle
//! calculation (there used for junction-speed limiting between two move
//! segments) into the angular cost used to rank candidate headings.

use crate::geometry::angle_between;
use nalgebra::Vector3;

/// One ranked candidate heading.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub direction: Vector3<f64>,
    pub cost: f64,
    /// True for the prepended exact world-to-goal direction, when it lies
    /// within the FOV. Selecting this candidate is what makes
    /// `can_reach_global_goal` true downstream.
    pub is_direct_to_goal: bool,
}

/// The precomputed FOV grid, expressed in the vehicle's body frame.
#[derive(Debug, Clone)]
pub struct CandidateGrid {
    directions: Vec<Vector3<f64>>,
    h_fov: f64,
    v_fov: f64,
}

impl CandidateGrid {
    /// Builds the grid once at startup. `h_fov`/`v_fov` are in radians;
    /// `v_samples == 0` is coerced to 1 (the grid degenerates to a single
    /// horizontal line of headings).
    pub fn new(h_fov: f64, v_fov: f64, h_samples: usize, v_samples: usize) -> Self {
        let h_samples = h_samples.max(1);
        let v_samples = v_samples.max(1);
        let thetas = linspace(-h_fov / 2.0, h_fov / 2.0, h_samples);
        let phis = linspace(-v_fov / 2.0, v_fov / 2.0, v_samples);

        let mut directions = Vec::with_capacity(h_samples * v_samples);
        for &phi in &phis {
            for &theta in &thetas {
                directions.push(Vector3::new(
                    theta.cos() * phi.cos(),
                    theta.sin() * phi.cos(),
                    phi.sin(),
                ));
            }
        }
        Self {
            directions,
            h_fov,
            v_fov,
        }
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// True if the exact goal direction falls inside both the horizontal
    /// and the vertical FOV.
    pub fn goal_in_fov(&self, goal_dir_body: &Vector3<f64>) -> bool {
        let theta = goal_dir_body.y.atan2(goal_dir_body.x);
        let phi = goal_dir_body.z.clamp(-1.0, 1.0).asin();
        theta.abs() <= self.h_fov / 2.0 && phi.abs() <= self.v_fov / 2.0
    }

    /// `v_los`: whether the goal direction is within the vertical FOV alone.
    pub fn goal_vertically_in_fov(&self, goal_dir_body: &Vector3<f64>) -> bool {
        let phi = goal_dir_body.z.clamp(-1.0, 1.0).asin();
        phi.abs() <= self.v_fov / 2.0
    }

    /// Ranks the grid (plus, if in FOV, the exact goal direction as a
    /// zero-cost extra candidate) by ascending angular cost to the goal and
    /// the last selected goal direction.
    pub fn rank(
        &self,
        goal_dir_body: Vector3<f64>,
        last_goal_dir_body: Option<Vector3<f64>>,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .directions
            .iter()
            .map(|&direction| {
                let to_goal = angle_between(&direction, &goal_dir_body);
                let to_last = last_goal_dir_body
                    .map(|last| angle_between(&direction, &last))
                    .unwrap_or(0.0);
                Candidate {
                    direction,
                    cost: to_goal * to_goal + to_last * to_last,
                    is_direct_to_goal: false,
                }
            })
            .collect();

        candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));

        if self.goal_in_fov(&goal_dir_body) {
            candidates.insert(
                0,
                Candidate {
                    direction: goal_dir_body,
                    cost: 0.0,
                    is_direct_to_goal: true,
                },
            );
        }
        candidates
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![(lo + hi) / 2.0];
    }
    (0..n)
        .map(|i| lo + (hi - lo) * (i as f64) / ((n - 1) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn v_samples_zero_is_coerced_to_one() {
        let grid = CandidateGrid::new(FRAC_PI_2, FRAC_PI_2, 5, 0);
        assert_eq!(grid.len(), 5);
        for d in &grid.directions {
            assert_relative_eq!(d.z, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn all_directions_are_unit_length() {
        let grid = CandidateGrid::new(1.0, 0.5, 7, 3);
        for d in &grid.directions {
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn direct_to_goal_candidate_is_prepended_when_in_fov() {
        let grid = CandidateGrid::new(FRAC_PI_2, FRAC_PI_2, 5, 3);
        let goal = Vector3::new(1.0, 0.0, 0.0);
        let ranked = grid.rank(goal, None);
        assert!(ranked[0].is_direct_to_goal);
        assert_relative_eq!(ranked[0].cost, 0.0);
    }

    #[test]
    fn out_of_fov_goal_is_not_prepended() {
        let grid = CandidateGrid::new(0.2, 0.2, 5, 3);
        let goal = Vector3::new(0.0, 1.0, 0.0);
        let ranked = grid.rank(goal, None);
        assert!(!ranked[0].is_direct_to_goal);
        assert_eq!(ranked.len(), grid.len());
    }

    #[test]
    fn ranking_is_deterministic() {
        let grid = CandidateGrid::new(1.0, 0.6, 9, 5);
        let goal = Vector3::new(0.9, 0.2, 0.1).normalize();
        let last = Vector3::new(0.8, -0.1, 0.0).normalize();
        let first = grid.rank(goal, Some(last));
        let second = grid.rank(goal, Some(last));
        for (a, b) in first.iter().zip(second.iter()) {
            assert_relative_eq!(a.cost, b.cost, epsilon = 1e-12);
            assert_relative_eq!(a.direction, b.direction, epsilon = 1e-12);
        }
    }
}
