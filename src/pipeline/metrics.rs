// src/pipeline/metrics.rs
//
// Per-drive event counts, owned by DrivingCore and summarised at the end of
// a replay.

use serde::Serialize;
use std::time::Instant;

#[derive(Debug)]
pub struct DriveMetrics {
    total_ticks: u64,
    lane_changes_started: u64,
    fcw_events: u64,
    mode_switches: u64,
    last_solver_us: u64,
    started_at: Instant,
}

impl DriveMetrics {
    pub fn new() -> Self {
        Self {
            total_ticks: 0,
            lane_changes_started: 0,
            fcw_events: 0,
            mode_switches: 0,
            last_solver_us: 0,
            started_at: Instant::now(),
        }
    }

    /// Closes a tick, keeping the solver time of the latest one.
    pub fn record_tick(&mut self, solver_secs: f32) {
        self.total_ticks += 1;
        self.last_solver_us = (solver_secs.max(0.0) * 1e6) as u64;
    }

    pub fn record_lane_change(&mut self) {
        self.lane_changes_started += 1;
    }

    pub fn record_fcw(&mut self) {
        self.fcw_events += 1;
    }

    pub fn record_mode_switch(&mut self) {
        self.mode_switches += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let elapsed_secs = self.started_at.elapsed().as_secs_f64();
        MetricsSummary {
            total_ticks: self.total_ticks,
            tick_rate: if elapsed_secs > 0.01 {
                self.total_ticks as f64 / elapsed_secs
            } else {
                0.0
            },
            lane_changes_started: self.lane_changes_started,
            fcw_events: self.fcw_events,
            mode_switches: self.mode_switches,
            last_solver_us: self.last_solver_us,
            elapsed_secs,
        }
    }
}

impl Default for DriveMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub tick_rate: f64,
    pub lane_changes_started: u64,
    pub fcw_events: u64,
    pub mode_switches: u64,
    pub last_solver_us: u64,
    pub elapsed_secs: f64,
}
