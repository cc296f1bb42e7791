//! C9: state-estimate ingest. Normalizes incoming orientation, detects and
//! absorbs estimator jumps while cruising, and snaps the tracked pose while
//! not flying. Grounded on the pose-update handling shape of AOS55's
//! `components/aircraft/state.rs`, generalized from an aerodynamic state
//! integrator to the spec's bias-absorption/snap rules.

use crate::geometry::{normalize_orientation, pose_jump};
use crate::mode::FlightMode;
use nalgebra::{UnitQuaternion, Vector3};

#[derive(Debug, Clone, Copy)]
pub struct StateEstimate {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestResult {
    pub orientation: UnitQuaternion<f64>,
    /// Offset absorbed into the tracked trajectory start, when a jump was
    /// detected while cruising.
    pub bias: Option<Vector3<f64>>,
    pub regenerate: bool,
    /// Position to snap the tracked pose to while not flying.
    pub snap_position: Option<Vector3<f64>>,
}

/// Processes one pose update against `previous_position` (the planner's
/// last tracked position row) and the current flight mode.
pub fn ingest(
    previous_position: Vector3<f64>,
    estimate: StateEstimate,
    mode: FlightMode,
    jump_thresh: f64,
) -> IngestResult {
    let orientation = normalize_orientation(estimate.orientation);

    let mut bias = None;
    let mut regenerate = false;
    if mode == FlightMode::Go && pose_jump(previous_position, estimate.position) > jump_thresh {
        bias = Some(estimate.position - previous_position);
        regenerate = true;
    }

    let snap_position = (mode == FlightMode::NotFlying).then_some(estimate.position);

    IngestResult {
        orientation,
        bias,
        regenerate,
        snap_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn estimate(position: Vector3<f64>) -> StateEstimate {
        StateEstimate {
            position,
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, 0.1),
        }
    }

    #[test]
    fn small_jump_while_go_is_ignored() {
        let result = ingest(
            Vector3::zeros(),
            estimate(Vector3::new(0.05, 0.0, 0.0)),
            FlightMode::Go,
            0.5,
        );
        assert!(result.bias.is_none());
        assert!(!result.regenerate);
    }

    #[test]
    fn large_jump_while_go_is_absorbed() {
        let result = ingest(
            Vector3::zeros(),
            estimate(Vector3::new(1.0, 0.0, 0.0)),
            FlightMode::Go,
            0.5,
        );
        assert_relative_eq!(result.bias.unwrap(), Vector3::new(1.0, 0.0, 0.0));
        assert!(result.regenerate);
    }

    #[test]
    fn jump_while_not_flying_snaps_instead_of_biasing() {
        let result = ingest(
            Vector3::zeros(),
            estimate(Vector3::new(3.0, 4.0, 0.0)),
            FlightMode::NotFlying,
            0.5,
        );
        assert!(result.bias.is_none());
        assert!(!result.regenerate);
        assert_eq!(result.snap_position, Some(Vector3::new(3.0, 4.0, 0.0)));
    }

    #[test]
    fn orientation_is_normalized() {
        let result = ingest(
            Vector3::zeros(),
            estimate(Vector3::zeros()),
            FlightMode::Flying,
            0.5,
        );
        assert_relative_eq!(result.orientation.into_inner().norm(), 1.0, epsilon = 1e-12);
    }
}
