//! Flight mode/event enums and the periodic output setpoint type.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightMode {
    #[default]
    NotFlying,
    Takeoff,
    Flying,
    Go,
    Land,
}

/// Asynchronous flight events, each carrying a sequence number so a caller
/// can correlate which setpoint tick first applied it (Section 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightEvent {
    Takeoff,
    Kill,
    Land,
    Init,
    Start,
    Estop,
}

/// The xy control submode, selected by the `mode(...)` input (Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Idle,
    Waypoint,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XyControl {
    Position,
    Acceleration,
}

impl ControlMode {
    pub fn xy_control(self) -> XyControl {
        match self {
            ControlMode::Idle | ControlMode::Waypoint => XyControl::Position,
            ControlMode::Other => XyControl::Acceleration,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Setpoint {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    pub jerk: [f64; 3],
    pub yaw: f64,
    pub yaw_rate: f64,
    pub xy_mode: XyControl,
    pub z_mode_position: bool,
    pub cut_power: bool,
    pub timestamp: DateTime<Utc>,
    pub frame: &'static str,
}

impl Setpoint {
    pub fn from_state(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
        jerk: Vector3<f64>,
        yaw: f64,
        yaw_rate: f64,
        xy_mode: XyControl,
        cut_power: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            position: position.into(),
            velocity: velocity.into(),
            acceleration: acceleration.into(),
            jerk: jerk.into(),
            yaw,
            yaw_rate,
            xy_mode,
            z_mode_position: true,
            cut_power,
            timestamp,
            frame: "world",
        }
    }

    pub fn idle_at(position: Vector3<f64>, yaw: f64, timestamp: DateTime<Utc>) -> Self {
        Self::from_state(
            position,
            Vector3::zeros(),
            Vector3::zeros(),
            Vector3::zeros(),
            yaw,
            0.0,
            XyControl::Position,
            true,
            timestamp,
        )
    }
}
