//! C2: composes three independent axis profiles into a 3-D trajectory and
//! evaluates the assembled `VehicleState` at time `t`. Axes are *not*
//! time-synchronized — each finishes as early as its own kinematics allow
//! (Section 9 open question i; a sync routine was observed disabled in the
//! source this spec was distilled from and is intentionally not built here).

use super::axis::{self, AxisLimits, AxisState, AxisProfile};
use crate::geometry::VehicleState;
use nalgebra::Vector3;

/// A fully generated 3-D motion primitive: one axis profile per axis, plus
/// the direction/speed it targets and the selector's bookkeeping fields.
#[derive(Debug, Clone, Copy)]
pub struct Trajectory3D {
    pub axes: [AxisProfile; 3],
    pub direction: Vector3<f64>,
    pub speed: f64,
}

impl Trajectory3D {
    /// Builds a trajectory from `state` toward `direction` (assumed unit
    /// length) at `speed`, independently solving each axis (C2's
    /// direction x speed -> per-axis terminal-velocity decomposition).
    pub fn generate(
        state: &VehicleState,
        direction: Vector3<f64>,
        speed: f64,
        limits: &AxisLimits,
        stop_check: bool,
    ) -> Self {
        let terminal_v = direction * speed;
        let axes = [
            axis::generate(
                AxisState {
                    x: state.position.x,
                    v: state.velocity.x,
                    a: state.acceleration.x,
                    j: state.jerk.x,
                },
                terminal_v.x,
                limits,
                stop_check,
            ),
            axis::generate(
                AxisState {
                    x: state.position.y,
                    v: state.velocity.y,
                    a: state.acceleration.y,
                    j: state.jerk.y,
                },
                terminal_v.y,
                limits,
                stop_check,
            ),
            axis::generate(
                AxisState {
                    x: state.position.z,
                    v: state.velocity.z,
                    a: state.acceleration.z,
                    j: state.jerk.z,
                },
                terminal_v.z,
                limits,
                stop_check,
            ),
        ];
        Self {
            axes,
            direction,
            speed,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.axes
            .iter()
            .map(AxisProfile::total_duration)
            .fold(0.0, f64::max)
    }

    /// Evaluates each axis independently at `t` and assembles the result.
    pub fn evaluate(&self, t: f64) -> VehicleState {
        let x = self.axes[0].evaluate(t);
        let y = self.axes[1].evaluate(t);
        let z = self.axes[2].evaluate(t);
        VehicleState {
            position: Vector3::new(x.x, y.x, z.x),
            velocity: Vector3::new(x.v, y.v, z.v),
            acceleration: Vector3::new(x.a, y.a, z.a),
            jerk: Vector3::new(x.j, y.j, z.j),
        }
    }

    /// Terminal (x, y) position, used by the stop-distance check (C7).
    pub fn terminal_xy(&self) -> (f64, f64) {
        let terminal = self.evaluate(self.total_duration());
        (terminal.position.x, terminal.position.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits() -> AxisLimits {
        AxisLimits {
            v_max: 5.0,
            a_max: 3.0,
            a_stop: 6.0,
            j_max: 10.0,
            gentle_jerk: 5.0,
        }
    }

    #[test]
    fn evaluate_at_zero_reproduces_initial_state() {
        let state = VehicleState::at_rest(Vector3::new(1.0, 2.0, 3.0));
        let traj = Trajectory3D::generate(&state, Vector3::new(1.0, 0.0, 0.0), 2.0, &limits(), false);
        let at_zero = traj.evaluate(0.0);
        assert_relative_eq!(at_zero.position, state.position, epsilon = 1e-9);
        assert_relative_eq!(at_zero.velocity, state.velocity, epsilon = 1e-9);
    }

    #[test]
    fn terminal_velocity_matches_direction_times_speed() {
        let state = VehicleState::at_rest(Vector3::zeros());
        let direction = Vector3::new(0.6, 0.8, 0.0);
        let speed = 3.0;
        let traj = Trajectory3D::generate(&state, direction, speed, &limits(), false);
        let terminal = traj.evaluate(traj.total_duration());
        assert_relative_eq!(terminal.velocity, direction * speed, epsilon = 1e-6);
    }
}
