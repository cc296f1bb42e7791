//! Section 10.3: TOML-backed configuration, mirroring every option in the
//! external-interfaces table under `[planner]`, `[grid]` and `[safety]`.
//! Default-function-per-field follows the teacher's enhanced config module
//! shape (`default_max_velocity`, `default_jerk`, ...).

use crate::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlannerError::InvalidConfig {
            field: "path",
            reason: e.to_string(),
        })?;
        let config: Config = toml::from_str(&contents).map_err(|e| PlannerError::InvalidConfig {
            field: "<toml>",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.h_samples < 1 {
            return Err(PlannerError::InvalidConfig {
                field: "grid.h_samples",
                reason: "must be at least 1".into(),
            });
        }
        if self.safety.z_min > self.safety.z_max {
            return Err(PlannerError::InvalidConfig {
                field: "safety.z_min",
                reason: format!("z_min ({}) > z_max ({})", self.safety.z_min, self.safety.z_max),
            });
        }
        if self.planner.max_speed <= 0.0 {
            return Err(PlannerError::InvalidConfig {
                field: "planner.max_speed",
                reason: "must be positive".into(),
            });
        }
        if self.planner.mem_distance < 0.0 {
            return Err(PlannerError::InvalidConfig {
                field: "planner.mem_distance",
                reason: "follow-primitive distance cannot be negative".into(),
            });
        }
        if self.planner.memory_ring_size < 1 {
            return Err(PlannerError::InvalidConfig {
                field: "planner.memory_ring_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.planner.plan_eval <= 0.0 {
            return Err(PlannerError::InvalidConfig {
                field: "planner.plan_eval",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            grid: GridConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_true")]
    pub use_memory: bool,
    #[serde(default = "default_safe_distance")]
    pub safe_distance: f64,
    #[serde(default = "default_buffer")]
    pub buffer: f64,
    #[serde(default = "default_sensor_distance")]
    pub sensor_distance: f64,
    /// Maximum travel distance, in meters, to follow a committed primitive
    /// before re-selecting (Section 6's `mem_distance`).
    #[serde(default = "default_mem_distance")]
    pub mem_distance: f64,
    /// Obstacle-memory ring capacity: number of recent scans retained
    /// (Section 4.4's "ring of size N", typically 3-10). Distinct from
    /// `mem_distance`, which is a travel distance, not a scan count.
    #[serde(default = "default_memory_ring_size")]
    pub memory_ring_size: usize,
    #[serde(default)]
    pub goal_x: f64,
    #[serde(default)]
    pub goal_y: f64,
    #[serde(default = "default_goal_z")]
    pub goal_z: f64,
    #[serde(default = "default_goal_radius")]
    pub goal_radius: f64,
    #[serde(default = "default_spinup_time")]
    pub spinup_time: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default = "default_accel")]
    pub accel: f64,
    #[serde(default = "default_accel_stop")]
    pub accel_stop: f64,
    #[serde(default = "default_jerk")]
    pub jerk: f64,
    /// Open question (ii): the reduced-jerk magnitude for small trims,
    /// exposed here instead of hardcoded.
    #[serde(default = "default_gentle_jerk")]
    pub gentle_jerk: f64,
    #[serde(default = "default_plan_eval")]
    pub plan_eval: f64,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_r_max")]
    pub r_max: f64,
    #[serde(default = "default_jump_thresh")]
    pub jump_thresh: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            use_memory: default_true(),
            safe_distance: default_safe_distance(),
            buffer: default_buffer(),
            sensor_distance: default_sensor_distance(),
            mem_distance: default_mem_distance(),
            memory_ring_size: default_memory_ring_size(),
            goal_x: 0.0,
            goal_y: 0.0,
            goal_z: default_goal_z(),
            goal_radius: default_goal_radius(),
            spinup_time: default_spinup_time(),
            max_speed: default_max_speed(),
            accel: default_accel(),
            accel_stop: default_accel_stop(),
            jerk: default_jerk(),
            gentle_jerk: default_gentle_jerk(),
            plan_eval: default_plan_eval(),
            k: default_k(),
            r_max: default_r_max(),
            jump_thresh: default_jump_thresh(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    #[serde(default = "default_h_fov_deg")]
    pub h_fov_deg: f64,
    #[serde(default = "default_v_fov_deg")]
    pub v_fov_deg: f64,
    #[serde(default = "default_h_samples")]
    pub h_samples: usize,
    #[serde(default)]
    pub v_samples: usize,
}

impl GridConfig {
    pub fn h_fov_rad(&self) -> f64 {
        self.h_fov_deg.to_radians()
    }
    pub fn v_fov_rad(&self) -> f64 {
        self.v_fov_deg.to_radians()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            h_fov_deg: default_h_fov_deg(),
            v_fov_deg: default_v_fov_deg(),
            h_samples: default_h_samples(),
            v_samples: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SafetyConfig {
    #[serde(default = "default_z_min")]
    pub z_min: f64,
    #[serde(default = "default_z_max")]
    pub z_max: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            z_min: default_z_min(),
            z_max: default_z_max(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_safe_distance() -> f64 {
    1.0
}
fn default_buffer() -> f64 {
    0.5
}
fn default_sensor_distance() -> f64 {
    5.0
}
fn default_mem_distance() -> f64 {
    1.0
}
fn default_memory_ring_size() -> usize {
    5
}
fn default_goal_z() -> f64 {
    1.0
}
fn default_goal_radius() -> f64 {
    0.3
}
fn default_spinup_time() -> f64 {
    2.0
}
fn default_max_speed() -> f64 {
    2.0
}
fn default_accel() -> f64 {
    2.0
}
fn default_accel_stop() -> f64 {
    4.0
}
fn default_jerk() -> f64 {
    10.0
}
fn default_gentle_jerk() -> f64 {
    5.0
}
fn default_plan_eval() -> f64 {
    0.05
}
fn default_k() -> usize {
    5
}
fn default_r_max() -> f64 {
    1.0
}
fn default_jump_thresh() -> f64 {
    0.5
}
fn default_h_fov_deg() -> f64 {
    80.0
}
fn default_v_fov_deg() -> f64 {
    40.0
}
fn default_h_samples() -> usize {
    9
}
fn default_z_min() -> f64 {
    0.2
}
fn default_z_max() -> f64 {
    3.0
}
