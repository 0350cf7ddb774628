// src/longitudinal/solver.rs
//
// Contract between the planner and the longitudinal MPC. The planner hands
// over bounds, the current state and model predictions on the solver's
// coarse grid; the solver returns a speed/accel/jerk plan on the same grid.
//
// KinematicSolver is a small reference implementation of the contract:
// proportional speed tracking toward the lowest of the cruise, lead-follow
// and (in blended mode) model targets, integrated within the accel bounds.

use super::accel_limits::AccelLimits;
use super::constants::{t_idxs_mpc, LON_MPC_N};
use crate::interp::{clip, finite_difference};
use crate::signal::LeadState;
use crate::types::{PlanSource, PlannerMode};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SolverInput {
    pub mode: PlannerMode,
    /// Filtered speed the plan starts from
    pub v_ego: f32,
    /// Accel the plan starts from (previous tick's accepted value)
    pub a_ego: f32,
    pub accel_limits: AccelLimits,
    /// Model predictions on the solver grid
    pub x: Vec<f32>,
    pub v: Vec<f32>,
    pub a: Vec<f32>,
    pub j: Vec<f32>,
    pub v_cruise: f32,
    pub lead_one: LeadState,
    pub lead_two: LeadState,
    /// Penalise deviating from the previous plan's accel
    pub prev_accel_constraint: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SolverOutput {
    /// LON_MPC_N + 1 samples
    pub v_solution: Vec<f32>,
    /// LON_MPC_N + 1 samples
    pub a_solution: Vec<f32>,
    /// LON_MPC_N samples
    pub j_solution: Vec<f32>,
    /// Seconds
    pub solve_time: f32,
    /// Consecutive solves that predicted a collision
    pub crash_cnt: u32,
    pub source: PlanSource,
}

pub trait LongitudinalSolver {
    fn solve(&mut self, input: &SolverInput) -> SolverOutput;
}

// ============================================================================
// REFERENCE SOLVER
// ============================================================================
/// Proportional gain from speed error to accel (1/s)
const K_SPEED: f32 = 0.6;
/// Desired time gap to the lead (s)
const T_FOLLOW: f32 = 1.45;
/// Standstill gap to the lead (m)
const STOP_DISTANCE: f32 = 6.0;
/// Gain from gap error to speed correction (1/s)
const K_GAP: f32 = 0.3;
/// Jerk bound while the previous plan constrains the start (m/s³)
const MAX_JERK: f32 = 5.0;
/// Time to collision that counts as a crash (s)
const CRASH_TTC: f32 = 2.5;

pub struct KinematicSolver {
    t_idxs: Vec<f32>,
    crash_cnt: u32,
}

impl KinematicSolver {
    pub fn new() -> Self {
        Self {
            t_idxs: t_idxs_mpc(),
            crash_cnt: 0,
        }
    }

    fn lead_target(lead: &LeadState, t: f32, s_ego: f32, v_ego: f32) -> Option<f32> {
        if !lead.status {
            return None;
        }
        // Lead decelerating to a stop stays stopped
        let t_stop = if lead.a_lead < 0.0 {
            (lead.v_lead / -lead.a_lead).min(t)
        } else {
            t
        };
        let v_lead_t = (lead.v_lead + lead.a_lead * t_stop).max(0.0);
        let d_lead_t = lead.d_rel + lead.v_lead * t_stop + 0.5 * lead.a_lead * t_stop * t_stop;
        let gap_error = (d_lead_t - s_ego) - (STOP_DISTANCE + T_FOLLOW * v_ego);
        Some((v_lead_t + K_GAP * gap_error).max(0.0))
    }

    fn collision_risk(lead: &LeadState, v_ego: f32) -> bool {
        if !lead.status {
            return false;
        }
        if lead.d_rel <= 0.0 {
            return true;
        }
        let closing = v_ego - lead.v_lead;
        closing > 0.0 && lead.d_rel / closing < CRASH_TTC
    }
}

impl Default for KinematicSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LongitudinalSolver for KinematicSolver {
    fn solve(&mut self, input: &SolverInput) -> SolverOutput {
        let started = Instant::now();
        let n = LON_MPC_N + 1;
        let limits = input.accel_limits;

        let mut v = vec![0.0; n];
        let mut a = vec![0.0; n];
        v[0] = input.v_ego.max(0.0);
        a[0] = input.a_ego;
        let mut s = 0.0;
        let mut source = PlanSource::Cruise;

        for i in 0..LON_MPC_N {
            let t = self.t_idxs[i];
            let dt = self.t_idxs[i + 1] - t;

            let mut target = input.v_cruise;
            let mut step_source = PlanSource::Cruise;
            for (lead, tag) in [
                (&input.lead_one, PlanSource::Lead0),
                (&input.lead_two, PlanSource::Lead1),
            ] {
                if let Some(lead_v) = Self::lead_target(lead, t, s, v[i]) {
                    if lead_v < target {
                        target = lead_v;
                        step_source = tag;
                    }
                }
            }
            if input.mode == PlannerMode::Blended {
                if let Some(&model_v) = input.v.get(i + 1) {
                    if model_v > 0.0 && model_v < target {
                        target = model_v;
                        step_source = PlanSource::E2e;
                    }
                }
            }
            if i == 0 {
                source = step_source;
            }

            let mut a_cmd = limits.clip(K_SPEED * (target - v[i]));
            if input.prev_accel_constraint {
                a_cmd = clip(a_cmd, a[i] - MAX_JERK * dt, a[i] + MAX_JERK * dt);
            }
            a[i + 1] = a_cmd;
            v[i + 1] = (v[i] + 0.5 * (a[i] + a[i + 1]) * dt).max(0.0);
            s += 0.5 * (v[i] + v[i + 1]) * dt;
        }

        let crash = Self::collision_risk(&input.lead_one, input.v_ego)
            || Self::collision_risk(&input.lead_two, input.v_ego);
        self.crash_cnt = if crash { self.crash_cnt + 1 } else { 0 };

        SolverOutput {
            j_solution: finite_difference(&self.t_idxs, &a),
            v_solution: v,
            a_solution: a,
            solve_time: started.elapsed().as_secs_f32(),
            crash_cnt: self.crash_cnt,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(v_ego: f32, v_cruise: f32) -> SolverInput {
        let n = LON_MPC_N + 1;
        SolverInput {
            mode: PlannerMode::Acc,
            v_ego,
            a_ego: 0.0,
            accel_limits: AccelLimits::new(-1.2, 1.0),
            x: vec![0.0; n],
            v: vec![0.0; n],
            a: vec![0.0; n],
            j: vec![0.0; n],
            v_cruise,
            lead_one: LeadState::default(),
            lead_two: LeadState::default(),
            prev_accel_constraint: true,
        }
    }

    #[test]
    fn test_output_shapes() {
        let mut solver = KinematicSolver::new();
        let out = solver.solve(&input(10.0, 20.0));
        assert_eq!(out.v_solution.len(), LON_MPC_N + 1);
        assert_eq!(out.a_solution.len(), LON_MPC_N + 1);
        assert_eq!(out.j_solution.len(), LON_MPC_N);
        assert_eq!(out.source, PlanSource::Cruise);
        assert!(out.solve_time >= 0.0);
    }

    #[test]
    fn test_accelerates_toward_cruise_within_limits() {
        let mut solver = KinematicSolver::new();
        let out = solver.solve(&input(10.0, 20.0));
        assert!(out.v_solution[LON_MPC_N] > 10.0);
        assert!(out.v_solution[LON_MPC_N] <= 20.0 + 1e-3);
        for &a in &out.a_solution[1..] {
            assert!((-1.2..=1.0).contains(&a));
        }
    }

    #[test]
    fn test_slow_lead_takes_over() {
        let mut solver = KinematicSolver::new();
        let mut inp = input(20.0, 30.0);
        inp.lead_one = LeadState {
            status: true,
            d_rel: 30.0,
            v_lead: 10.0,
            a_lead: 0.0,
        };
        let out = solver.solve(&inp);
        assert_eq!(out.source, PlanSource::Lead0);
        assert!(out.a_solution[1] < 0.0);
    }

    #[test]
    fn test_crash_counter_counts_consecutive_risk() {
        let mut solver = KinematicSolver::new();
        let mut inp = input(25.0, 30.0);
        inp.lead_one = LeadState {
            status: true,
            d_rel: 20.0,
            v_lead: 5.0,
            a_lead: 0.0,
        };
        for expected in 1..=4 {
            assert_eq!(solver.solve(&inp).crash_cnt, expected);
        }
        inp.lead_one.status = false;
        assert_eq!(solver.solve(&inp).crash_cnt, 0);
    }

    #[test]
    fn test_blended_follows_model_speed() {
        let mut solver = KinematicSolver::new();
        let mut inp = input(15.0, 30.0);
        inp.mode = PlannerMode::Blended;
        inp.accel_limits = AccelLimits::new(-3.5, 2.0);
        inp.v = vec![5.0; LON_MPC_N + 1];
        let out = solver.solve(&inp);
        assert_eq!(out.source, PlanSource::E2e);
        assert!(out.v_solution[LON_MPC_N] < 15.0);
    }

    #[test]
    fn test_jerk_bounded_when_constrained() {
        let mut solver = KinematicSolver::new();
        let mut inp = input(0.0, 30.0);
        inp.accel_limits = AccelLimits::new(-3.5, 2.0);
        let out = solver.solve(&inp);
        for &j in &out.j_solution {
            assert!(j.abs() <= MAX_JERK + 1e-3);
        }
    }
}
