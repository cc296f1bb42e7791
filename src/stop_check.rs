//! C7: the stop-distance check. Generates a braking (stop_check) profile
//! toward the current heading, projects its terminal position, and compares
//! the resulting horizontal distance against what's left to the goal.
//! Grounded on `src/motion/adaptive_planner.rs`'s braking-distance style
//! checks, generalized to the spec's 3-D stop-profile projection.

use crate::geometry::VehicleState;
use crate::trajectory::{AxisLimits, Trajectory3D};
use nalgebra::Vector3;

/// Stop distance is clamped from below to avoid oscillation as commanded
/// speed approaches zero.
pub const MIN_STOP_DISTANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct StopDecision {
    pub should_stop: bool,
    pub stop_distance: f64,
}

/// Horizontal braking distance for the current state along `direction`.
pub fn stop_distance(state: &VehicleState, direction: Vector3<f64>, limits: &AxisLimits) -> f64 {
    let stop_traj = Trajectory3D::generate(state, direction, 0.0, limits, true);
    let (tx, ty) = stop_traj.terminal_xy();
    let d = ((tx - state.position.x).powi(2) + (ty - state.position.y).powi(2)).sqrt();
    d.max(MIN_STOP_DISTANCE)
}

/// Decides whether the vehicle should brake now to stop at (or before) the
/// global goal.
pub fn evaluate(
    state: &VehicleState,
    goal_xy: (f64, f64),
    direction: Vector3<f64>,
    limits: &AxisLimits,
) -> StopDecision {
    let d_stop = stop_distance(state, direction, limits);
    let remaining =
        ((goal_xy.0 - state.position.x).powi(2) + (goal_xy.1 - state.position.y).powi(2)).sqrt();
    StopDecision {
        should_stop: d_stop >= remaining,
        stop_distance: d_stop,
    }
}
