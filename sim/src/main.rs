//! Plays scripted pose/point-cloud/command sequences against a
//! `PlannerActor` and records the emitted setpoint stream to JSONL,
//! directly usable to encode end-to-end scenarios as replayable fixtures.
//! Grounded on `krusty_simulator::main`'s JSONL step-recording idiom.

mod event_queue;

use std::time::Duration;

use aero_planner::config::Config;
use aero_planner::ingest::StateEstimate;
use aero_planner::mode::FlightEvent;
use aero_planner::planner::{CloudScan, Command, PlannerActor};
use event_queue::{ScenarioQueue, ScenarioStep, SimClock};
use nalgebra::{UnitQuaternion, Vector3};

fn obstacle_free_cruise() -> ScenarioQueue {
    let mut q = ScenarioQueue::new();
    q.push(ScenarioStep {
        timestamp: Duration::ZERO,
        event: event_queue::ScenarioEvent::State(StateEstimate {
            position: Vector3::new(0.0, 0.0, 1.0),
            orientation: UnitQuaternion::identity(),
        }),
    });
    q.push(ScenarioStep::flight_event(Duration::ZERO, FlightEvent::Init, 1));
    q.push(ScenarioStep::flight_event(Duration::from_millis(50), FlightEvent::Takeoff, 2));
    q.push(ScenarioStep {
        timestamp: Duration::from_millis(100),
        event: event_queue::ScenarioEvent::Command(Command::Goal {
            x: 10.0,
            y: 0.0,
            z: 1.0,
            heading: 0.0,
        }),
    });
    for i in 0..200 {
        q.push(ScenarioStep {
            timestamp: Duration::from_millis(100 + i * 50),
            event: event_queue::ScenarioEvent::Cloud(CloudScan {
                points: vec![],
                frame_id: "camera".into(),
            }),
        });
    }
    q
}

fn frontal_block() -> ScenarioQueue {
    let mut q = obstacle_free_cruise();
    let wall: Vec<Vector3<f64>> = (-10..=10).map(|i| Vector3::new(4.0, i as f64 * 0.1, 1.0)).collect();
    for i in 0..50 {
        q.push(ScenarioStep {
            timestamp: Duration::from_millis(200 + i * 50),
            event: event_queue::ScenarioEvent::Cloud(CloudScan {
                points: wall.clone(),
                frame_id: "camera".into(),
            }),
        });
    }
    q
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let scenario_name = std::env::args().nth(1).unwrap_or_else(|| "cruise".to_string());
    let mut queue = match scenario_name.as_str() {
        "frontal_block" => frontal_block(),
        _ => obstacle_free_cruise(),
    };

    let mut config = Config::default();
    config.planner.goal_x = 10.0;
    config.planner.goal_y = 0.0;
    config.planner.goal_z = 1.0;
    config.planner.k = 1;
    let plan_eval = Duration::from_secs_f64(config.planner.plan_eval);

    let mut actor = PlannerActor::new(config);
    let mut clock = SimClock::default();
    let horizon = Duration::from_secs(15);

    println!("# scenario: {scenario_name}");
    while clock.now < horizon {
        while let Some(step) = queue.pop_due(clock.now) {
            match step.event {
                event_queue::ScenarioEvent::State(estimate) => actor.process_state(estimate),
                event_queue::ScenarioEvent::Cloud(scan) => actor.process_cloud(scan),
                event_queue::ScenarioEvent::Command(cmd) => actor.process_command(cmd),
            }
        }
        let setpoint = actor.tick();
        println!("{}", serde_json::to_string(&setpoint).unwrap());
        clock.advance(plan_eval);
        if queue.is_empty() && clock.now > Duration::from_secs(2) {
            // scripted inputs exhausted; keep ticking to let the vehicle arrive.
        }
    }
}
