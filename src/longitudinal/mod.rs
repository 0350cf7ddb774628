// src/longitudinal/mod.rs
//
// Longitudinal planning.
//
// Signal flow:
//   SignalFrame → accel_limits → solver (coarse grid) → planner (fine grid)
//                                                    ↘ conditional gate

pub mod accel_limits;
pub mod conditional;
pub mod constants;
pub mod planner;
pub mod solver;

pub use accel_limits::{limits, AccelLimits, LimitSet};
pub use conditional::{ConditionDecision, ConditionEvaluator, DebounceCounter};
pub use constants::{CONTROL_N, DT_MDL, LON_MPC_N, TRAJECTORY_SIZE};
pub use planner::{LongitudinalPlanner, PlanMessage};
pub use solver::{KinematicSolver, LongitudinalSolver, SolverInput, SolverOutput};
