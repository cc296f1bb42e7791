//! End-to-end scenario tests driving `PlannerActor` directly, tick by
//! tick, the same way the `sim` harness does.

use aero_planner::config::Config;
use aero_planner::ingest::StateEstimate;
use aero_planner::mode::FlightEvent;
use aero_planner::planner::{CloudScan, Command, PlannerActor};
use nalgebra::{UnitQuaternion, Vector3};

fn base_config() -> Config {
    let mut c = Config::default();
    c.planner.goal_x = 10.0;
    c.planner.goal_y = 0.0;
    c.planner.goal_z = 1.0;
    c.planner.k = 1;
    c.planner.plan_eval = 0.05;
    c
}

fn fly_to_go(actor: &mut PlannerActor) {
    actor.process_state(StateEstimate {
        position: Vector3::new(0.0, 0.0, 1.0),
        orientation: UnitQuaternion::identity(),
    });
    actor.process_command(Command::Event { kind: FlightEvent::Init, seq: 1 });
    actor.process_command(Command::Event { kind: FlightEvent::Start, seq: 2 });
    actor.process_command(Command::Goal { x: 10.0, y: 0.0, z: 1.0, heading: 0.0 });
}

#[test]
fn obstacle_free_cruise_converges_toward_goal() {
    let mut actor = PlannerActor::new(base_config());
    fly_to_go(&mut actor);
    actor.process_cloud(CloudScan { points: vec![], frame_id: "camera".into() });

    let mut last_position = [0.0_f64; 3];
    for _ in 0..400 {
        let sp = actor.tick();
        last_position = sp.position;
    }
    let remaining = ((10.0 - last_position[0]).powi(2) + last_position[1].powi(2)).sqrt();
    assert!(remaining < 9.0, "expected meaningful progress toward goal, got {remaining}");
}

#[test]
fn frontal_wall_keeps_vehicle_clear_of_the_corridor() {
    let mut actor = PlannerActor::new(base_config());
    fly_to_go(&mut actor);
    let wall: Vec<Vector3<f64>> = (-15..=15).map(|i| Vector3::new(4.0, i as f64 * 0.1, 1.0)).collect();
    actor.process_cloud(CloudScan { points: wall, frame_id: "camera".into() });

    for _ in 0..400 {
        let sp = actor.tick();
        let in_corridor = (sp.position[0] - 4.0).abs() < 0.4 && sp.position[1].abs() < 1.0;
        assert!(!in_corridor, "vehicle entered the blocked corridor at {:?}", sp.position);
    }
}

#[test]
fn estimator_jump_is_absorbed_without_a_discontinuity_larger_than_the_jump() {
    let mut actor = PlannerActor::new(base_config());
    fly_to_go(&mut actor);
    actor.process_cloud(CloudScan { points: vec![], frame_id: "camera".into() });
    for _ in 0..10 {
        actor.tick();
    }
    let before = actor.tick().position;
    actor.process_state(StateEstimate {
        position: Vector3::new(before[0] + 1.0, before[1], before[2]),
        orientation: UnitQuaternion::identity(),
    });
    let after = actor.tick().position;
    let step = ((after[0] - before[0]).powi(2) + (after[1] - before[1]).powi(2)).sqrt();
    assert!(step <= 1.0 + 0.2, "setpoint jumped by more than the injected offset: {step}");
}

#[test]
fn emergency_stop_brings_speed_to_zero_and_holds() {
    let mut actor = PlannerActor::new(base_config());
    fly_to_go(&mut actor);
    actor.process_cloud(CloudScan { points: vec![], frame_id: "camera".into() });
    for _ in 0..50 {
        actor.tick();
    }
    actor.process_command(Command::Event { kind: FlightEvent::Estop, seq: 3 });
    let mut last_speed = f64::INFINITY;
    for _ in 0..200 {
        let sp = actor.tick();
        let speed = (sp.velocity[0].powi(2) + sp.velocity[1].powi(2) + sp.velocity[2].powi(2)).sqrt();
        last_speed = speed;
    }
    assert!(last_speed < 1e-2, "vehicle did not settle after an emergency stop: {last_speed}");
}

#[test]
fn takeoff_ramps_z_up_to_the_goal_altitude() {
    let mut actor = PlannerActor::new(base_config());
    actor.process_state(StateEstimate {
        position: Vector3::zeros(),
        orientation: UnitQuaternion::identity(),
    });
    actor.process_command(Command::Event { kind: FlightEvent::Takeoff, seq: 1 });

    let mut last_z = 0.0;
    for _ in 0..1000 {
        let sp = actor.tick();
        assert!(sp.position[2] <= 1.0 + 1e-9);
        last_z = sp.position[2];
        if last_z >= 1.0 - 1e-9 {
            break;
        }
    }
    assert!((last_z - 1.0).abs() < 1e-6, "takeoff did not reach goal altitude: {last_z}");
    assert_eq!(actor.mode(), aero_planner::mode::FlightMode::Go);
}
