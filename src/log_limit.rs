//! Per-key rate-limited logging, so a persistent fault (e.g. "no feasible
//! path") produces one log line per window instead of flooding the log.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the last time each key fired so callers can gate a log line.
pub struct RateLimitedLog {
    window: Duration,
    last_fired: HashMap<&'static str, Instant>,
}

impl RateLimitedLog {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
        }
    }

    /// Returns true the first time `key` is seen, and again once `window`
    /// has elapsed since the last time it returned true.
    pub fn should_log(&mut self, key: &'static str, now: Instant) -> bool {
        match self.last_fired.get(key) {
            Some(last) if now.duration_since(*last) < self.window => false,
            _ => {
                self.last_fired.insert(key, now);
                true
            }
        }
    }
}
