//! Scripted scenario event queue. Grounded on
//! `krusty_simulator::simulator::event_queue`'s `SimEventQueue`/`SimClock`
//! pair (a `BinaryHeap` of timestamped events plus a monotonic sim clock),
//! adapted from stepper/heater events to planner input events.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use aero_planner::ingest::StateEstimate;
use aero_planner::mode::FlightEvent;
use aero_planner::planner::{CloudScan, Command};

#[derive(Debug, Clone)]
pub enum ScenarioEvent {
    State(StateEstimate),
    Cloud(CloudScan),
    Command(Command),
}

/// One scheduled event. `FlightEvent` events are expressed through
/// `Command::Event` with a scenario-assigned sequence number.
pub struct ScenarioStep {
    pub timestamp: Duration,
    pub event: ScenarioEvent,
}

impl ScenarioStep {
    pub fn flight_event(timestamp: Duration, kind: FlightEvent, seq: u64) -> Self {
        Self {
            timestamp,
            event: ScenarioEvent::Command(Command::Event { kind, seq }),
        }
    }
}

impl PartialEq for ScenarioStep {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
    }
}
impl Eq for ScenarioStep {}
impl PartialOrd for ScenarioStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScenarioStep {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest timestamp first.
        other.timestamp.cmp(&self.timestamp)
    }
}

pub struct ScenarioQueue {
    heap: BinaryHeap<ScenarioStep>,
}

impl ScenarioQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, step: ScenarioStep) {
        self.heap.push(step);
    }

    pub fn pop_due(&mut self, now: Duration) -> Option<ScenarioStep> {
        if self.heap.peek().is_some_and(|s| s.timestamp <= now) {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Monotonic simulation clock, advanced in fixed steps by the driver loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub now: Duration,
}

impl SimClock {
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
    }
}
