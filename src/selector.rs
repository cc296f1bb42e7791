//! C6: the primitive selector. Iterates the ranked candidate set, testing
//! each via the collision evaluator (C5), stopping at the first reachable
//! one. Falls back to the minimum-cost "follow primitive" when nothing is
//! reachable, or reports [`SelectionOutcome::NoFeasiblePath`].
//! Generalizes `src/motion/planner.rs`'s queue-draining loop shape (try
//! candidates in order, commit to the first that works).

use crate::candidates::Candidate;
use crate::collision::{evaluate_candidate, evaluate_trajectory, CollisionOutcome, CollisionParams};
use crate::geometry::VehicleState;
use crate::obstacle_memory::{ObstacleMemory, SpatialIndex};
use crate::trajectory::{AxisLimits, Trajectory3D};
use nalgebra::Vector3;

#[derive(Debug, Clone, Copy)]
pub struct SelectedPrimitive {
    pub trajectory: Trajectory3D,
    pub local_goal: Vector3<f64>,
    pub cost: f64,
    /// True when no candidate was fully reachable and this is the
    /// least-cost partial advance instead.
    pub following: bool,
    pub can_reach_global_goal: bool,
}

pub enum SelectionOutcome {
    Selected(SelectedPrimitive),
    NoFeasiblePath,
}

/// Runs the full selection pass: candidates are already sorted ascending by
/// cost and expressed in the vehicle body frame; `body_to_world` rotates a
/// chosen direction into the world frame for the returned `local_goal`.
pub fn select<T: SpatialIndex>(
    candidates: &[Candidate],
    state: &VehicleState,
    speed: f64,
    goal_xy: (f64, f64),
    sensor_distance: f64,
    limits: &AxisLimits,
    memory: &ObstacleMemory<T>,
    params: &CollisionParams,
    body_to_world: impl Fn(Vector3<f64>) -> Vector3<f64>,
) -> SelectionOutcome {
    let d_goal =
        ((goal_xy.0 - state.position.x).powi(2) + (goal_xy.1 - state.position.y).powi(2)).sqrt();

    let mut best_fallback: Option<(Trajectory3D, Vector3<f64>, f64)> = None;

    for candidate in candidates {
        let world_dir = body_to_world(candidate.direction);
        let (trajectory, outcome) =
            evaluate_candidate(state, world_dir, speed, goal_xy, limits, memory, params);

        if outcome.reachable {
            return SelectionOutcome::Selected(SelectedPrimitive {
                trajectory,
                local_goal: world_dir,
                cost: candidate.cost,
                following: false,
                can_reach_global_goal: candidate.is_direct_to_goal && d_goal <= sensor_distance,
            });
        }

        if outcome.cost.is_finite() {
            let better = match &best_fallback {
                Some((_, _, best_cost)) => outcome.cost < *best_cost,
                None => true,
            };
            if better {
                best_fallback = Some((trajectory, world_dir, outcome.cost));
            }
        }
    }

    match best_fallback {
        Some((trajectory, world_dir, cost)) => SelectionOutcome::Selected(SelectedPrimitive {
            trajectory,
            local_goal: world_dir,
            cost,
            following: true,
            can_reach_global_goal: false,
        }),
        None => SelectionOutcome::NoFeasiblePath,
    }
}

/// The rolling check of the currently-active primitive: re-evaluates it in
/// place (no regeneration) to see whether it's still clear.
pub fn still_clear<T: SpatialIndex>(
    active: &Trajectory3D,
    state: &VehicleState,
    goal_xy: (f64, f64),
    memory: &ObstacleMemory<T>,
    params: &CollisionParams,
) -> CollisionOutcome {
    evaluate_trajectory(active, state, goal_xy, memory, params)
}

/// Memory-of-commitment: whether the vehicle may keep following its
/// current primitive rather than re-selecting, given the freshest best
/// candidate cost found this tick.
pub fn should_keep_following(
    still_clear: bool,
    distance_since_commit: f64,
    mem_distance: f64,
    committed_cost: f64,
    fresh_best_cost: f64,
) -> bool {
    still_clear && distance_since_commit < mem_distance && fresh_best_cost >= committed_cost
}
