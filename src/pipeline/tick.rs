// src/pipeline/tick.rs
//
// Runs one model tick through both planners:
//   1. lane change state machine → Desire
//   2. longitudinal planner update → PlanMessage
// and folds the transitions into DriveMetrics.

use super::metrics::DriveMetrics;
use crate::lateral::LaneChangeStateMachine;
use crate::longitudinal::planner::{LongitudinalPlanner, PlanMessage};
use crate::longitudinal::solver::LongitudinalSolver;
use crate::settings::SettingsStore;
use crate::signal::SignalFrame;
use crate::types::{Config, Desire, LaneChangeDirection, LaneChangeState};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TickOutput {
    pub desire: Desire,
    pub lane_change_state: LaneChangeState,
    pub lane_change_direction: LaneChangeDirection,
    pub lane_line_prob: f32,
    pub plan: PlanMessage,
}

pub struct DrivingCore<S: LongitudinalSolver, St: SettingsStore> {
    lane_change: LaneChangeStateMachine,
    planner: LongitudinalPlanner<S, St>,
    metrics: DriveMetrics,
    prev_fcw: bool,
    prev_conditional_mode: bool,
}

impl<S: LongitudinalSolver, St: SettingsStore> DrivingCore<S, St> {
    pub fn new(config: &Config, solver: S, store: St) -> Self {
        Self {
            lane_change: LaneChangeStateMachine::new(config.lane_change.clone()),
            planner: LongitudinalPlanner::new(config, solver, store),
            metrics: DriveMetrics::new(),
            prev_fcw: false,
            prev_conditional_mode: false,
        }
    }

    pub fn tick(&mut self, frame: &SignalFrame, dt: f32) -> TickOutput {
        let prev_state = self.lane_change.state;
        let desire = self.lane_change.update(frame, dt);
        if prev_state != LaneChangeState::Starting
            && self.lane_change.state == LaneChangeState::Starting
        {
            self.metrics.record_lane_change();
        }

        self.planner.update(frame, dt);
        let plan = self.planner.publish();

        if plan.fcw && !self.prev_fcw {
            self.metrics.record_fcw();
        }
        self.prev_fcw = plan.fcw;

        if plan.conditional_mode != self.prev_conditional_mode {
            self.metrics.record_mode_switch();
        }
        self.prev_conditional_mode = plan.conditional_mode;

        self.metrics.record_tick(plan.solver_execution_time);

        TickOutput {
            desire,
            lane_change_state: self.lane_change.state,
            lane_change_direction: self.lane_change.direction,
            lane_line_prob: self.lane_change.ll_prob,
            plan,
        }
    }

    pub fn metrics(&self) -> &DriveMetrics {
        &self.metrics
    }

    pub fn planner(&self) -> &LongitudinalPlanner<S, St> {
        &self.planner
    }

    pub fn lane_change(&self) -> &LaneChangeStateMachine {
        &self.lane_change
    }
}
