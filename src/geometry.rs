//! Vehicle state representation and small geometric helpers shared across
//! the trajectory generator, collision evaluator and state ingest.

use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// The 4x3 vehicle state: rows are position, velocity, acceleration, jerk;
/// columns are x, y, z. Stored as four `Vector3`s rather than an actual
/// `nalgebra::Matrix4x3` so each row reads and writes as an ordinary vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub jerk: Vector3<f64>,
}

impl VehicleState {
    pub fn at_rest(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn xy(&self) -> Vector3<f64> {
        Vector3::new(self.position.x, self.position.y, 0.0)
    }
}

/// Wraps an angle to (-pi, pi].
pub fn angle_wrap(mut angle: f64) -> f64 {
    angle %= 2.0 * PI;
    if angle <= -PI {
        angle += 2.0 * PI;
    } else if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

/// Shortest signed angular difference `to - from`, wrapped to (-pi, pi].
pub fn angle_diff(from: f64, to: f64) -> f64 {
    angle_wrap(to - from)
}

/// Normalizes an orientation quaternion. `normalize(q)` applied twice equals
/// `normalize(q)` once, and the result always has unit norm (callers rely on
/// this for the state-ingest idempotence property).
pub fn normalize_orientation(q: UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(q.into_inner().normalize())
}

/// Euclidean distance between two pose estimates, used by the jump detector.
pub fn pose_jump(previous: Vector3<f64>, current: Vector3<f64>) -> f64 {
    (current - previous).norm()
}

/// Angle in radians between two (not necessarily normalized) vectors.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let cos_theta = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
    cos_theta.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn angle_wrap_stays_in_range() {
        for raw in [0.0, PI, -PI, 3.0 * PI, -3.0 * PI, 0.5, -0.5] {
            let wrapped = angle_wrap(raw);
            assert!(wrapped > -PI - 1e-9 && wrapped <= PI + 1e-9, "{wrapped}");
        }
    }

    #[test]
    fn angle_wrap_preserves_equivalence_class() {
        assert_relative_eq!(angle_wrap(2.0 * PI + 0.3), 0.3, epsilon = 1e-9);
        assert_relative_eq!(angle_wrap(-PI), PI, epsilon = 1e-9);
    }

    #[test]
    fn normalize_is_idempotent() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let once = normalize_orientation(q);
        let twice = normalize_orientation(once);
        assert_relative_eq!(once.into_inner().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(once.angle(), twice.angle(), epsilon = 1e-12);
    }

    #[test]
    fn angle_between_parallel_is_zero() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(angle_between(&a, &b), 0.0, epsilon = 1e-12);
    }
}
