//! C1: the 1-D triple-integrator axis trajectory generator.
//!
//! Computes a 3-segment, jerk-bounded profile from an arbitrary initial
//! state to a commanded terminal velocity, and evaluates it at any time.
//! Generalizes `src/motion/trajectory.rs`'s segment-based `MotionState`
//! evaluation shape from a distance-driven trapezoidal/S-curve move to the
//! spec's closed-form, velocity-to-velocity triple integrator.

/// A point (x, v, a, j) at a segment boundary. Logically one column of the
/// spec's 4x4 switch matrix (rows x, v, a, j); stored as four named points
/// rather than a literal matrix for readability.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwitchPoint {
    pub x: f64,
    pub v: f64,
    pub a: f64,
    pub j: f64,
}

/// Initial conditions handed to the generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisState {
    pub x: f64,
    pub v: f64,
    pub a: f64,
    pub j: f64,
}

/// Kinematic bounds the generator must respect.
#[derive(Debug, Clone, Copy)]
pub struct AxisLimits {
    pub v_max: f64,
    pub a_max: f64,
    pub a_stop: f64,
    pub j_max: f64,
    /// The reduced jerk used for small trims (Section 9 open question ii:
    /// exposed as a parameter instead of the original hardcoded magic number).
    pub gentle_jerk: f64,
}

/// A generated axis profile: segment durations plus the four switch points
/// (start of segment 1, start of segment 2, start of segment 3, terminal).
#[derive(Debug, Clone, Copy)]
pub struct AxisProfile {
    pub durations: [f64; 3],
    pub switch: [SwitchPoint; 4],
}

impl AxisProfile {
    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Evaluates the profile at time `t`, clamped to `[0, +inf)`. Beyond
    /// `total_duration` the vehicle has reached the commanded terminal
    /// velocity with zero residual acceleration/jerk, so position keeps
    /// advancing at that constant velocity rather than holding still.
    pub fn evaluate(&self, t: f64) -> SwitchPoint {
        let t = t.max(0.0);
        let b1 = self.durations[0];
        let b2 = b1 + self.durations[1];
        let b3 = b2 + self.durations[2];

        if t >= b3 {
            let terminal = self.switch[3];
            return SwitchPoint {
                x: terminal.x + terminal.v * (t - b3),
                ..terminal
            };
        }
        let (start, local_t, jerk) = if t < b1 {
            (self.switch[0], t, self.switch[0].j)
        } else if t < b2 {
            (self.switch[1], t - b1, 0.0)
        } else {
            (self.switch[2], t - b2, self.switch[2].j)
        };
        integrate(start, local_t, jerk)
    }
}

/// Advances a constant-jerk segment forward by `dt`.
fn integrate(start: SwitchPoint, dt: f64, jerk: f64) -> SwitchPoint {
    SwitchPoint {
        x: start.x + start.v * dt + 0.5 * start.a * dt * dt + (1.0 / 6.0) * jerk * dt * dt * dt,
        v: start.v + start.a * dt + 0.5 * jerk * dt * dt,
        a: start.a + jerk * dt,
        j: jerk,
    }
}

/// Generates the minimum-time jerk-bounded profile taking `initial` to
/// terminal velocity `v_f`. `stop_check` forces full jerk with the gentler
/// `a_stop` acceleration cap (braking profiles never use the gentle-jerk
/// small-trim path).
pub fn generate(initial: AxisState, v_f: f64, limits: &AxisLimits, stop_check: bool) -> AxisProfile {
    let delta = v_f - initial.v;

    // Step 1: already at the commanded velocity with no residual acceleration.
    if delta == 0.0 && initial.a == 0.0 {
        let terminal = SwitchPoint {
            x: initial.x,
            v: v_f,
            a: 0.0,
            j: 0.0,
        };
        return AxisProfile {
            durations: [0.0, 0.0, 0.0],
            switch: [terminal, terminal, terminal, terminal],
        };
    }

    // Step 2: choose the signed jerk for segment 1.
    let a_cap = if stop_check { limits.a_stop } else { limits.a_max };
    let direction = if delta != 0.0 {
        delta.signum()
    } else {
        // delta == 0 but initial.a != 0: no net velocity change is
        // commanded, the profile only needs to bleed off the residual
        // acceleration. Pick the sign that drives acceleration toward
        // zero; see Section 9 open question (i)'s sibling note in
        // DESIGN.md for why this edge isn't covered verbatim by the spec.
        -initial.a.signum()
    };
    let use_gentle = !stop_check
        && limits.v_max > 0.0
        && (delta.abs() / limits.v_max) < 0.2
        && initial.a.abs() != limits.a_max
        && initial.j.abs() != limits.j_max;
    let j = direction * if use_gentle { limits.gentle_jerk } else { limits.j_max };

    // Step 3: single-segment shortcut when the current acceleration alone
    // (integrated to zero) already lands within 2% of v_f.
    let vfp = initial.v + (initial.a * initial.a) / (2.0 * j);
    if (vfp - v_f).abs() <= 0.02 * v_f.abs() && initial.a * delta > 0.0 {
        let t1 = initial.a / j;
        let seg1_end = integrate(
            SwitchPoint {
                x: initial.x,
                v: initial.v,
                a: initial.a,
                j: -j,
            },
            t1,
            -j,
        );
        let start = SwitchPoint {
            x: initial.x,
            v: initial.v,
            a: initial.a,
            j: -j,
        };
        return AxisProfile {
            durations: [t1, 0.0, 0.0],
            switch: [start, seg1_end, seg1_end, seg1_end],
        };
    }

    // Step 4: two-segment symmetric solve, with acceleration-cap clamping.
    let discriminant = (0.5 * initial.a * initial.a + j * delta).max(0.0);
    let sqrt_d = discriminant.sqrt();
    let root_a = (-initial.a + sqrt_d) / j;
    let root_b = (-initial.a - sqrt_d) / j;
    let mut t1 = match (root_a >= 0.0, root_b >= 0.0) {
        (true, true) => root_a.min(root_b),
        (true, false) => root_a,
        (false, true) => root_b,
        (false, false) => 0.0,
    };
    let mut t2 = 0.0;
    let mut t3;
    let a1f = initial.a + j * t1;
    if a1f.abs() > a_cap {
        let a_m = j.signum() * a_cap;
        t1 = (a_m - initial.a) / j;
        t3 = a_m / j;
        t2 = (v_f - initial.v - 0.5 * (a_m + initial.a) * t1 - 0.5 * a_m * t3) / a_m;
        t2 = t2.max(0.0);
    } else {
        t3 = (initial.a + j * t1) / j;
    }
    t1 = t1.max(0.0);
    t3 = t3.max(0.0);

    // Step 5: propagate forward through the three segments.
    let p0 = SwitchPoint {
        x: initial.x,
        v: initial.v,
        a: initial.a,
        j,
    };
    let p1 = integrate(p0, t1, j);
    let p1_coast = SwitchPoint { j: 0.0, ..p1 };
    let p2 = integrate(p1_coast, t2, 0.0);
    let p2_brake = SwitchPoint { j: -j, ..p2 };
    let p3 = integrate(p2_brake, t3, -j);
    let terminal = SwitchPoint {
        x: p3.x,
        v: v_f,
        a: 0.0,
        j: 0.0,
    };

    AxisProfile {
        durations: [t1, t2, t3],
        switch: [p0, p1_coast, p2_brake, terminal],
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
    fn zero_delta_zero_accel_is_instant() {
        let profile = generate(
            AxisState {
                x: 1.0,
                v: 2.0,
                a: 0.0,
                j: 0.0,
            },
            2.0,
            &limits(),
            false,
        );
        assert_eq!(profile.durations, [0.0, 0.0, 0.0]);
        let p0 = profile.evaluate(0.0);
        assert_relative_eq!(p0.x, 1.0);
        assert_relative_eq!(p0.v, 2.0);
    }

    #[test]
    fn evaluate_at_zero_reproduces_initial_state() {
        let initial = AxisState {
            x: 0.3,
            v: -1.5,
            a: 0.6,
            j: 0.0,
        };
        let profile = generate(initial, 2.5, &limits(), false);
        let at_zero = profile.evaluate(0.0);
        assert_relative_eq!(at_zero.x, initial.x, epsilon = 1e-9);
        assert_relative_eq!(at_zero.v, initial.v, epsilon = 1e-9);
        assert_relative_eq!(at_zero.a, initial.a, epsilon = 1e-9);
    }

    #[test]
    fn terminal_state_hits_commanded_velocity_with_zero_accel_and_jerk() {
        let initial = AxisState {
            x: 0.0,
            v: 0.0,
            a: 0.0,
            j: 0.0,
        };
        for v_f in [3.0, -3.0, 0.5, -4.5] {
            let profile = generate(initial, v_f, &limits(), false);
            let terminal = profile.evaluate(profile.total_duration());
            assert_relative_eq!(terminal.v, v_f, epsilon = 1e-6);
            assert_relative_eq!(terminal.a, 0.0, epsilon = 1e-6);
            assert_relative_eq!(terminal.j, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn acceleration_never_exceeds_cap() {
        let initial = AxisState {
            x: 0.0,
            v: -4.0,
            a: 1.0,
            j: 0.0,
        };
        let l = limits();
        let profile = generate(initial, 4.0, &l, false);
        let total = profile.total_duration();
        let steps = 200;
        for i in 0..=steps {
            let t = total * (i as f64) / (steps as f64);
            let s = profile.evaluate(t);
            assert!(s.a.abs() <= l.a_max + 1e-6, "a={} at t={}", s.a, t);
            assert!(s.j.abs() <= l.j_max + 1e-6, "j={} at t={}", s.j, t);
        }
    }

    #[test]
    fn stop_check_uses_a_stop_cap() {
        let initial = AxisState {
            x: 0.0,
            v: 5.0,
            a: 0.0,
            j: 0.0,
        };
        let l = limits();
        let profile = generate(initial, 0.0, &l, true);
        let total = profile.total_duration();
        let steps = 200;
        for i in 0..=steps {
            let t = total * (i as f64) / (steps as f64);
            let s = profile.evaluate(t);
            assert!(s.a.abs() <= l.a_stop + 1e-6, "a={} at t={}", s.a, t);
        }
        let terminal = profile.evaluate(total);
        assert_relative_eq!(terminal.v, 0.0, epsilon = 1e-6);
    }
}
