//! C8: the flight-mode state machine and fixed-rate setpoint loop, plus
//! the `Command` channel and the `PlannerActor` that owns all mutable plan
//! state. Grounded on `src/printer.rs`'s `Printer` actor: background loops
//! each built from a `tokio::time::interval` inside a `tokio::select!`,
//! subscribed to a `broadcast` shutdown channel, publishing shared state
//! through an `Arc<RwLock<..>>` snapshot.

use std::sync::Arc;
use std::time::Instant as StdInstant;

use chrono::Utc;
use nalgebra::{UnitQuaternion, Vector3};
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::candidates::CandidateGrid;
use crate::collision::{CollisionParams, DefaultMemory};
use crate::config::Config;
use crate::error::PlannerError;
use crate::geometry::{angle_diff, angle_wrap, VehicleState};
use crate::ingest::{ingest, StateEstimate};
use crate::log_limit::RateLimitedLog;
use crate::mode::{ControlMode, FlightEvent, FlightMode, Setpoint};
use crate::obstacle_memory::ObstacleMemory;
use crate::selector::{select, should_keep_following, still_clear, SelectionOutcome};
use crate::stop_check::evaluate as evaluate_stop;
use crate::trajectory::{AxisLimits, Trajectory3D};

/// One point-cloud scan, already transformed to the world frame by an
/// external collaborator (Section 1's out-of-scope sensor-frame transform).
#[derive(Debug, Clone)]
pub struct CloudScan {
    pub points: Vec<Vector3<f64>>,
    pub frame_id: String,
}

/// The three asynchronous, non-timer inputs share one command channel.
#[derive(Debug, Clone)]
pub enum Command {
    Goal {
        x: f64,
        y: f64,
        z: f64,
        heading: f64,
    },
    Event {
        kind: FlightEvent,
        seq: u64,
    },
    SetMode(ControlMode),
}

/// The handles an external driver uses to feed a running [`PlannerActor`]
/// and observe its output.
pub struct PlannerHandles {
    pub state_tx: mpsc::Sender<StateEstimate>,
    pub cloud_tx: mpsc::Sender<CloudScan>,
    pub command_tx: mpsc::Sender<Command>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub setpoint: Arc<RwLock<Setpoint>>,
    pub debug_tx: broadcast::Sender<String>,
}

const TAKEOFF_STEP: f64 = 0.003;
const LAND_FLOOR: f64 = -0.1;
const YAW_REALIGN_THRESHOLD: f64 = std::f64::consts::FRAC_PI_2;

pub struct PlannerActor {
    config: Config,
    limits: AxisLimits,
    grid: CandidateGrid,
    collision_params: CollisionParams,
    memory: DefaultMemory,

    state: VehicleState,
    yaw: f64,
    mode: FlightMode,
    xy_control: ControlMode,

    active: Trajectory3D,
    /// Seconds elapsed since `active` was generated, advanced one
    /// `plan_eval` per tick rather than read from the wall clock so replay
    /// (the `sim` harness) and real-time operation evaluate identically.
    t_since_regen: f64,
    gen_new_traj: bool,
    stop: bool,
    following_prim: bool,
    can_reach_goal: bool,
    e_stop: bool,

    local_goal: Vector3<f64>,
    last_goal_dir: Option<Vector3<f64>>,
    commit_origin_xy: (f64, f64),
    committed_cost: f64,

    goal: (f64, f64, f64),
    final_heading: f64,
    heading: f64,

    log_limiter: RateLimitedLog,
}

impl PlannerActor {
    pub fn new(config: Config) -> Self {
        let limits = AxisLimits {
            v_max: config.planner.max_speed,
            a_max: config.planner.accel,
            a_stop: config.planner.accel_stop,
            j_max: config.planner.jerk,
            gentle_jerk: config.planner.gentle_jerk,
        };
        let grid = CandidateGrid::new(
            config.grid.h_fov_rad(),
            config.grid.v_fov_rad(),
            config.grid.h_samples,
            config.grid.v_samples,
        );
        let collision_params = CollisionParams {
            buffer: config.planner.buffer,
            safe_distance: config.planner.safe_distance,
            sensor_distance: config.planner.sensor_distance,
            z_min: config.safety.z_min,
            z_max: config.safety.z_max,
            k: config.planner.k,
        };
        let memory = ObstacleMemory::new(config.planner.memory_ring_size);
        let state = VehicleState::default();
        let active = Trajectory3D::generate(&state, Vector3::x(), 0.0, &limits, false);
        let goal = (config.planner.goal_x, config.planner.goal_y, config.planner.goal_z);

        Self {
            local_goal: Vector3::x(),
            last_goal_dir: None,
            commit_origin_xy: (0.0, 0.0),
            committed_cost: f64::INFINITY,
            goal,
            final_heading: 0.0,
            heading: 0.0,
            yaw: 0.0,
            mode: FlightMode::NotFlying,
            xy_control: ControlMode::Idle,
            active,
            t_since_regen: 0.0,
            gen_new_traj: false,
            stop: false,
            following_prim: false,
            can_reach_goal: false,
            e_stop: false,
            log_limiter: RateLimitedLog::new(std::time::Duration::from_secs(1)),
            limits,
            grid,
            collision_params,
            memory,
            state,
            config,
        }
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    fn body_to_world(&self, body: Vector3<f64>) -> Vector3<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.yaw) * body
    }

    fn goal_xy(&self) -> (f64, f64) {
        (self.goal.0, self.goal.1)
    }

    /// Handles a `state(...)` input: C9 ingest, applied immediately.
    pub fn process_state(&mut self, estimate: StateEstimate) {
        let result = ingest(
            self.state.position,
            estimate,
            self.mode,
            self.config.planner.jump_thresh,
        );

        if let Some(bias) = result.bias {
            self.state.position += bias;
            tracing::warn!(jump_mag = bias.norm(), "absorbed estimator jump");
            self.gen_new_traj = true;
        }
        if let Some(snap) = result.snap_position {
            self.state.position = snap;
        }
        let (_, _, yaw) = result.orientation.euler_angles();
        if self.mode == FlightMode::NotFlying {
            self.yaw = yaw;
        }
    }

    /// Handles a `point_cloud(...)` input: C4 insertion, C3/C6 selection,
    /// C5 rolling re-check of the active primitive.
    pub fn process_cloud(&mut self, scan: CloudScan) {
        let valid: Vec<Vector3<f64>> = scan
            .points
            .iter()
            .copied()
            .filter(|p| p.iter().all(|v| v.is_finite()))
            .collect();

        if valid.len() < self.config.planner.k {
            if self.log_limiter.should_log("sparse_cloud", StdInstant::now()) {
                tracing::warn!(
                    got = valid.len(),
                    required = self.config.planner.k,
                    "sparse point cloud, skipping selection this tick"
                );
            }
            return;
        }

        let moving_or_yawing = self.state.velocity.norm() > 1e-6 || self.mode == FlightMode::Go;
        if moving_or_yawing && !self.stop {
            self.memory.insert(&valid);
        }

        let goal_world = Vector3::new(self.goal.0 - self.state.position.x, self.goal.1 - self.state.position.y, 0.0);
        let goal_dir_body = if goal_world.norm() > 1e-9 {
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -self.yaw) * goal_world.normalize()
        } else {
            Vector3::x()
        };

        let still_ok = still_clear(&self.active, &self.state, self.goal_xy(), &self.memory, &self.collision_params);
        let (dx, dy) = (
            self.state.position.x - self.commit_origin_xy.0,
            self.state.position.y - self.commit_origin_xy.1,
        );
        let distance_since_commit = (dx * dx + dy * dy).sqrt();

        let ranked = self.grid.rank(goal_dir_body, self.last_goal_dir);
        let fresh_best = ranked.first().map(|c| c.cost).unwrap_or(f64::INFINITY);

        let keep = self.config.planner.use_memory
            && still_ok.reachable
            && should_keep_following(
                true,
                distance_since_commit,
                self.config.planner.mem_distance,
                self.committed_cost,
                fresh_best,
            );
        if keep {
            return;
        }

        let speed = self.config.planner.max_speed;
        match select(
            &ranked,
            &self.state,
            speed,
            self.goal_xy(),
            self.config.planner.sensor_distance,
            &self.limits,
            &self.memory,
            &self.collision_params,
            |d| self.body_to_world(d),
        ) {
            SelectionOutcome::Selected(sel) => {
                self.local_goal = sel.local_goal;
                self.last_goal_dir = Some(goal_dir_body);
                self.committed_cost = sel.cost;
                self.following_prim = sel.following;
                self.can_reach_goal = sel.can_reach_global_goal;
                self.commit_origin_xy = (self.state.position.x, self.state.position.y);
                self.gen_new_traj = true;
            }
            SelectionOutcome::NoFeasiblePath => {
                if self.log_limiter.should_log("no_feasible_path", StdInstant::now()) {
                    tracing::error!("no feasible path: every sampled candidate is blocked");
                }
                self.stop = true;
                self.gen_new_traj = true;
            }
        }
    }

    /// Handles a goal/flight-event/mode command.
    pub fn process_command(&mut self, cmd: Command) {
        match cmd {
            Command::Goal { x, y, z, heading } => {
                self.goal = (x, y, z);
                self.final_heading = heading;
                self.heading = (self.goal.1 - self.state.position.y)
                    .atan2(self.goal.0 - self.state.position.x);
                self.gen_new_traj = true;
            }
            Command::SetMode(mode) => self.xy_control = mode,
            Command::Event { kind, .. } => self.apply_event(kind),
        }
    }

    fn apply_event(&mut self, event: FlightEvent) {
        match (self.mode, event) {
            (FlightMode::NotFlying, FlightEvent::Takeoff) => {
                tracing::info!(from = "NotFlying", to = "Takeoff", "mode transition");
                self.mode = FlightMode::Takeoff;
            }
            (_, FlightEvent::Kill) => {
                tracing::info!(to = "NotFlying", "mode transition (kill)");
                self.mode = FlightMode::NotFlying;
                self.state.velocity = Vector3::zeros();
                self.state.acceleration = Vector3::zeros();
            }
            (_, FlightEvent::Land) if self.mode != FlightMode::NotFlying => {
                tracing::info!(to = "Land", "mode transition");
                self.mode = FlightMode::Land;
                self.stop = true;
                self.gen_new_traj = true;
            }
            (FlightMode::Flying, FlightEvent::Start) => {
                tracing::info!(from = "Flying", to = "Go", "mode transition");
                self.mode = FlightMode::Go;
            }
            (FlightMode::Go, FlightEvent::Estop) => {
                tracing::warn!("emergency stop requested");
                self.e_stop = true;
                self.stop = true;
                self.gen_new_traj = true;
            }
            (_, FlightEvent::Init) => {
                tracing::info!(to = "Flying", "mode transition (init)");
                self.mode = FlightMode::Flying;
                self.e_stop = false;
            }
            _ => {}
        }
    }

    /// One fixed-rate tick: Section 4.8's six per-tick duties.
    pub fn tick(&mut self) -> Setpoint {
        let now = Utc::now();

        match self.mode {
            FlightMode::NotFlying => {
                return Setpoint::idle_at(self.state.position, self.yaw, now);
            }
            FlightMode::Takeoff => {
                let target_z = (self.state.position.z + TAKEOFF_STEP).min(self.goal.2);
                self.state.position.z = target_z;
                if (target_z - self.goal.2).abs() < 1e-9 {
                    tracing::info!(from = "Takeoff", to = "Go", "mode transition");
                    self.mode = FlightMode::Go;
                    self.gen_new_traj = true;
                }
                return Setpoint::from_state(
                    self.state.position,
                    Vector3::zeros(),
                    Vector3::zeros(),
                    Vector3::zeros(),
                    self.yaw,
                    0.0,
                    self.xy_control.xy_control(),
                    false,
                    now,
                );
            }
            FlightMode::Land => {
                if self.state.velocity.norm() < 1e-3 {
                    self.state.position.z -= TAKEOFF_STEP;
                    if self.state.position.z <= LAND_FLOOR {
                        tracing::info!(from = "Land", to = "NotFlying", "mode transition");
                        self.mode = FlightMode::NotFlying;
                    }
                }
            }
            FlightMode::Flying | FlightMode::Go => {}
        }

        // 1. regenerate if flagged.
        if self.gen_new_traj {
            let speed = if self.stop { 0.0 } else { self.config.planner.max_speed };
            self.active = Trajectory3D::generate(&self.state, self.local_goal, speed, &self.limits, self.stop);
            self.t_since_regen = 0.0;
            self.gen_new_traj = false;
        }

        // 2. yaw control while in Go.
        let mut yaw_rate = 0.0;
        if self.mode == FlightMode::Go {
            let near_goal = {
                let (gx, gy) = self.goal_xy();
                ((gx - self.state.position.x).powi(2) + (gy - self.state.position.y).powi(2)).sqrt()
                    <= self.config.planner.goal_radius
            };
            let target = if near_goal { self.final_heading } else { self.heading };
            let diff = angle_diff(self.yaw, target);
            let stopped = self.state.velocity.norm() < 1e-3;
            if diff.abs() > YAW_REALIGN_THRESHOLD || stopped {
                if !self.stop {
                    self.stop = true;
                    self.gen_new_traj = true;
                }
            }
            let max_step = self.config.planner.r_max * self.config.planner.plan_eval;
            let step = diff.clamp(-max_step, max_step);
            self.yaw = angle_wrap(self.yaw + step);
            yaw_rate = step / self.config.planner.plan_eval.max(1e-9);
        }

        // 3. stop-distance check.
        if self.mode == FlightMode::Go && !self.stop {
            let decision = evaluate_stop(&self.state, self.goal_xy(), self.local_goal, &self.limits);
            if decision.should_stop {
                self.stop = true;
                self.gen_new_traj = true;
                if self.config.planner.debug {
                    tracing::debug!(margin = decision.stop_distance, "stop-distance check triggered");
                }
            }
        }

        // 4. evaluate active trajectory.
        self.t_since_regen += self.config.planner.plan_eval;
        self.state = self.active.evaluate(self.t_since_regen);

        // 5. arrival handling.
        let stopped = self.state.velocity.norm() < 1e-3;
        if stopped && self.stop {
            self.stop = false;
            yaw_rate = 0.0;
            let (gx, gy) = self.goal_xy();
            let within_goal = ((gx - self.state.position.x).powi(2)
                + (gy - self.state.position.y).powi(2))
            .sqrt()
                <= self.config.planner.goal_radius;
            if within_goal {
                tracing::info!("arrived at goal");
            } else if !self.e_stop {
                self.gen_new_traj = true;
            }
        }

        // 6. publish.
        Setpoint::from_state(
            self.state.position,
            self.state.velocity,
            self.state.acceleration,
            self.state.jerk,
            self.yaw,
            yaw_rate,
            self.xy_control.xy_control(),
            false,
            now,
        )
    }

    /// Spawns the actor's `tokio::select!` loop per Section 13, returning
    /// the handles an external driver uses to feed it.
    pub fn spawn(mut self) -> PlannerHandles {
        let (state_tx, mut state_rx) = mpsc::channel::<StateEstimate>(16);
        let (cloud_tx, mut cloud_rx) = mpsc::channel::<CloudScan>(4);
        let (command_tx, mut command_rx) = mpsc::channel::<Command>(16);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let (debug_tx, _) = broadcast::channel::<String>(16);

        let setpoint = Arc::new(RwLock::new(Setpoint::idle_at(
            Vector3::zeros(),
            0.0,
            Utc::now(),
        )));

        let handles = PlannerHandles {
            state_tx,
            cloud_tx,
            command_tx,
            shutdown_tx: shutdown_tx.clone(),
            setpoint: setpoint.clone(),
            debug_tx: debug_tx.clone(),
        };

        tokio::spawn(async move {
            let plan_eval = self.config.planner.plan_eval;
            let mut interval = tokio::time::interval(std::time::Duration::from_secs_f64(plan_eval.max(1e-3)));
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("planner actor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.tick()));
                        let sp = match result {
                            Ok(sp) => sp,
                            Err(_) => {
                                tracing::error!("tick panicked, degrading to safe stop");
                                self.stop = true;
                                self.gen_new_traj = true;
                                Setpoint::idle_at(self.state.position, self.yaw, Utc::now())
                            }
                        };
                        *setpoint.write().await = sp;
                        if self.config.planner.debug {
                            if let Ok(json) = serde_json::to_string(&*setpoint.read().await) {
                                let _ = debug_tx.send(json);
                            }
                        }
                    }
                    Some(estimate) = state_rx.recv() => {
                        self.process_state(estimate);
                    }
                    Some(scan) = cloud_rx.recv() => {
                        self.process_cloud(scan);
                    }
                    Some(cmd) = command_rx.recv() => {
                        self.process_command(cmd);
                    }
                }
            }
        });

        handles
    }
}

impl From<PlannerError> for Setpoint {
    fn from(_: PlannerError) -> Self {
        Setpoint::idle_at(Vector3::zeros(), 0.0, Utc::now())
    }
}
