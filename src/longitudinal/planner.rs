// src/longitudinal/planner.rs
//
// Longitudinal planner. One update per model tick:
//   1. mode + accel limits
//   2. reset or low-pass the speed state
//   3. resample model predictions onto the solver grid
//   4. solve, resample the plan onto the output grid
//   5. advance the held state one tick for the next initial condition
//   6. conditional mode gate
// publish() turns the latest state into a PlanMessage.

use super::accel_limits::{limits, AccelLimits, PREV_ACCEL_MARGIN};
use super::conditional::{ConditionDecision, ConditionEvaluator};
use super::constants::{t_idxs, t_idxs_mpc, CONTROL_N, LON_MPC_N, TRAJECTORY_SIZE, V_CRUISE_MAX};
use super::solver::{LongitudinalSolver, SolverInput, SolverOutput};
use crate::conversions::KPH_TO_MS;
use crate::filter::FirstOrderFilter;
use crate::interp::{finite_difference, interp, interp_many};
use crate::settings::SettingsStore;
use crate::signal::{LeadState, ModelFrame, SignalFrame};
use crate::types::{Config, ConditionalConfig, PlanSource, PlannerMode, VehicleConfig};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Time constant of the speed filter (s)
pub const V_EGO_FILTER_RC: f32 = 2.0;
/// Solver crash count above which FCW is raised
const FCW_CRASH_CNT: u32 = 2;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanMessage {
    pub valid: bool,
    pub model_mono_time: u64,
    pub speeds: Vec<f32>,
    pub accels: Vec<f32>,
    pub jerks: Vec<f32>,
    pub has_lead: bool,
    pub source: PlanSource,
    pub fcw: bool,
    /// Seconds spent in the solver
    pub solver_execution_time: f32,
    pub mode: PlannerMode,
    pub conditional_mode: bool,
    pub conditional_status: u8,
}

/// Model predictions resampled onto the solver grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverPredictions {
    pub x: Vec<f32>,
    pub v: Vec<f32>,
    pub a: Vec<f32>,
    pub j: Vec<f32>,
}

impl SolverPredictions {
    fn zeros(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            v: vec![0.0; n],
            a: vec![0.0; n],
            j: vec![0.0; n],
        }
    }
}

/// Resample model x/v/a onto the solver grid and remove the model's speed
/// bias. Malformed predictions become zeros.
pub fn parse_model(
    model: &ModelFrame,
    model_error: f32,
    t_model: &[f32],
    t_mpc: &[f32],
) -> SolverPredictions {
    let complete = model.position.x.len() == TRAJECTORY_SIZE
        && model.velocity.x.len() == TRAJECTORY_SIZE
        && model.acceleration.x.len() == TRAJECTORY_SIZE;
    if !complete {
        return SolverPredictions::zeros(t_mpc.len());
    }

    let x = interp_many(t_mpc, t_model, &model.position.x)
        .into_iter()
        .zip(t_mpc)
        .map(|(x, &t)| x - model_error * t)
        .collect();
    let v = interp_many(t_mpc, t_model, &model.velocity.x)
        .into_iter()
        .map(|v| v - model_error)
        .collect();
    let a = interp_many(t_mpc, t_model, &model.acceleration.x);

    SolverPredictions {
        x,
        v,
        a,
        j: vec![0.0; t_mpc.len()],
    }
}

pub struct LongitudinalPlanner<S: LongitudinalSolver, St: SettingsStore> {
    vehicle: VehicleConfig,
    conditional: ConditionalConfig,
    solver: S,
    store: St,
    evaluator: ConditionEvaluator,

    t_idxs: Vec<f32>,
    t_idxs_mpc: Vec<f32>,

    mode: PlannerMode,
    v_desired_filter: FirstOrderFilter,
    a_desired: f32,
    v_model_error: f32,
    accel_limits: AccelLimits,

    v_desired_trajectory: Vec<f32>,
    a_desired_trajectory: Vec<f32>,
    j_desired_trajectory: Vec<f32>,

    fcw: bool,
    crash_cnt: u32,
    solve_time: f32,
    source: PlanSource,
    has_lead: bool,
    valid: bool,
    model_mono_time: u64,
    decision: ConditionDecision,
}

impl<S: LongitudinalSolver, St: SettingsStore> LongitudinalPlanner<S, St> {
    pub fn new(config: &Config, solver: S, store: St) -> Self {
        Self {
            vehicle: config.vehicle.clone(),
            conditional: config.conditional.clone(),
            solver,
            store,
            evaluator: ConditionEvaluator::new(config.conditional.clone()),
            t_idxs: t_idxs(),
            t_idxs_mpc: t_idxs_mpc(),
            mode: PlannerMode::Acc,
            v_desired_filter: FirstOrderFilter::new(0.0, V_EGO_FILTER_RC),
            a_desired: 0.0,
            v_model_error: 0.0,
            accel_limits: AccelLimits::new(0.0, 0.0),
            v_desired_trajectory: vec![0.0; CONTROL_N],
            a_desired_trajectory: vec![0.0; CONTROL_N],
            j_desired_trajectory: vec![0.0; CONTROL_N],
            fcw: false,
            crash_cnt: 0,
            solve_time: 0.0,
            source: PlanSource::Cruise,
            has_lead: false,
            valid: false,
            model_mono_time: 0,
            decision: ConditionDecision::default(),
        }
    }

    pub fn update(&mut self, frame: &SignalFrame, dt: f32) {
        let dt = dt.max(0.0);
        let car = &frame.car;
        let controls = &frame.controls;

        self.mode = if controls.experimental_mode {
            PlannerMode::Blended
        } else {
            PlannerMode::Acc
        };

        let v_ego = car.v_ego;
        let mut v_cruise = controls.v_cruise_kph.min(V_CRUISE_MAX) * KPH_TO_MS;

        let limit_set = limits(v_ego, car.steering_angle_deg, self.mode, &self.vehicle);

        let reset_state = if self.vehicle.openpilot_longitudinal {
            controls.long_control_off
        } else {
            !controls.enabled
        };
        let prev_accel_constraint = !(reset_state || car.standstill);

        if reset_state {
            self.v_desired_filter.reset(v_ego);
            self.a_desired = limit_set.cruise.clip(car.a_ego);
        }

        // Ignore the measurement while reset so the snap above holds
        let filtered = if reset_state {
            self.v_desired_filter.x
        } else {
            self.v_desired_filter.update(v_ego, dt)
        };
        self.v_desired_filter.x = filtered.max(0.0);

        if let Some(&v_model) = frame.model.temporal_pose_trans.first() {
            self.v_model_error = v_model - v_ego;
        }

        if controls.force_decel {
            v_cruise = 0.0;
        }

        self.accel_limits = limit_set.turns.straddle(self.a_desired, PREV_ACCEL_MARGIN);
        debug!(
            "📐 Accel limits [{:.2}, {:.2}] mode={:?}",
            self.accel_limits.min, self.accel_limits.max, self.mode
        );

        let predictions = parse_model(
            &frame.model,
            self.v_model_error,
            &self.t_idxs,
            &self.t_idxs_mpc,
        );
        let (lead_one, lead_two) = if frame.radar.valid {
            (frame.radar.lead_one, frame.radar.lead_two)
        } else {
            (LeadState::default(), LeadState::default())
        };

        let input = SolverInput {
            mode: self.mode,
            v_ego: self.v_desired_filter.x,
            a_ego: self.a_desired,
            accel_limits: self.accel_limits,
            x: predictions.x,
            v: predictions.v,
            a: predictions.a,
            j: predictions.j,
            v_cruise,
            lead_one,
            lead_two,
            prev_accel_constraint,
        };
        let output = sanitize(self.solver.solve(&input));

        let t_out = &self.t_idxs[..CONTROL_N];
        self.v_desired_trajectory = interp_many(t_out, &self.t_idxs_mpc, &output.v_solution);
        self.a_desired_trajectory = interp_many(t_out, &self.t_idxs_mpc, &output.a_solution);
        let jerk = finite_difference(&self.t_idxs_mpc, &output.a_solution);
        self.j_desired_trajectory = interp_many(t_out, &self.t_idxs_mpc[..LON_MPC_N], &jerk);

        self.crash_cnt = output.crash_cnt;
        self.solve_time = output.solve_time;
        self.source = output.source;

        let fcw = self.crash_cnt > FCW_CRASH_CNT && !car.standstill;
        if fcw && !self.fcw {
            info!("🚨 FCW: solver predicts collision ({} solves)", self.crash_cnt);
        }
        self.fcw = fcw;

        // Held state for the next tick's initial condition
        let a_prev = self.a_desired;
        self.a_desired = interp(dt, t_out, &self.a_desired_trajectory);
        self.v_desired_filter.x += dt * (self.a_desired + a_prev) / 2.0;

        self.has_lead = frame.radar.has_lead();
        self.valid = car.valid && controls.valid;
        self.model_mono_time = frame.model_mono_time;

        if !self.conditional.enabled {
            self.decision = ConditionDecision::default();
        } else if car.cruise_available {
            self.decision = self.evaluator.evaluate(frame, &mut self.store);
        }
    }

    pub fn publish(&self) -> PlanMessage {
        PlanMessage {
            valid: self.valid,
            model_mono_time: self.model_mono_time,
            speeds: self.v_desired_trajectory.clone(),
            accels: self.a_desired_trajectory.clone(),
            jerks: self.j_desired_trajectory.clone(),
            has_lead: self.has_lead,
            source: self.source,
            fcw: self.fcw,
            solver_execution_time: self.solve_time,
            mode: self.mode,
            conditional_mode: self.decision.use_alternate,
            conditional_status: self.decision.status.code(),
        }
    }

    pub fn mode(&self) -> PlannerMode {
        self.mode
    }

    pub fn a_desired(&self) -> f32 {
        self.a_desired
    }

    pub fn v_desired(&self) -> f32 {
        self.v_desired_filter.x
    }

    pub fn accel_limits(&self) -> AccelLimits {
        self.accel_limits
    }

    pub fn fcw(&self) -> bool {
        self.fcw
    }

    pub fn decision(&self) -> ConditionDecision {
        self.decision
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn store(&self) -> &St {
        &self.store
    }
}

/// Replace solution arrays of the wrong length with zeros.
fn sanitize(mut output: SolverOutput) -> SolverOutput {
    let n = LON_MPC_N + 1;
    if output.v_solution.len() != n || output.a_solution.len() != n {
        warn!(
            "⚠️ Solver returned {} speeds / {} accels, expected {}",
            output.v_solution.len(),
            output.a_solution.len(),
            n
        );
        output.v_solution = vec![0.0; n];
        output.a_solution = vec![0.0; n];
    }
    output
}
