//! Wall-clock budget for one decision tick

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent ticks kept for averages
const HISTORY: usize = 120;

/// Measures how long the current tick has been running
#[derive(Debug, Clone)]
pub struct TickBudget {
    limit: Duration,
    started: Instant,
    tick_times: VecDeque<Duration>,
    overruns: u64,
}

impl TickBudget {
    pub fn new(limit_millis: f64) -> Self {
        Self {
            limit: Duration::from_secs_f64(limit_millis.max(0.0) / 1000.0),
            started: Instant::now(),
            tick_times: VecDeque::with_capacity(HISTORY),
            overruns: 0,
        }
    }

    /// Call at the start of each tick.
    pub fn begin(&mut self) {
        self.started = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The tick has used up its budget
    pub fn exceeded(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// Call at the end of each tick; returns the tick's duration.
    pub fn end(&mut self, overran: bool) -> Duration {
        let elapsed = self.elapsed();
        self.tick_times.push_back(elapsed);
        if self.tick_times.len() > HISTORY {
            self.tick_times.pop_front();
        }
        if overran {
            self.overruns += 1;
        }
        elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Ticks that degraded because the budget ran out
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Average tick time in milliseconds over the recent history
    pub fn avg_tick_ms(&self) -> f64 {
        if self.tick_times.is_empty() {
            return 0.0;
        }
        let sum: Duration = self.tick_times.iter().sum();
        sum.as_secs_f64() * 1000.0 / self.tick_times.len() as f64
    }

    /// Slowest recent tick in milliseconds
    pub fn max_tick_ms(&self) -> f64 {
        self.tick_times
            .iter()
            .max()
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}
