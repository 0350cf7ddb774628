// src/longitudinal/constants.rs
//
// Time grids shared by the longitudinal modules.

/// Model tick period (s)
pub const DT_MDL: f32 = 0.05;

/// Samples in a model trajectory
pub const TRAJECTORY_SIZE: usize = 33;
/// Solver horizon steps; the solver grid has LON_MPC_N + 1 points
pub const LON_MPC_N: usize = 12;
/// Samples of the published plan
pub const CONTROL_N: usize = 17;

const MAX_T: f32 = 10.0;

/// Cruise set speed ceiling (kph)
pub const V_CRUISE_MAX: f32 = 145.0;

/// Quadratically spaced grid: dense near t = 0, sparse at the horizon.
fn quadratic_grid(max_idx: usize) -> Vec<f32> {
    (0..=max_idx)
        .map(|i| MAX_T * (i as f32 / max_idx as f32).powi(2))
        .collect()
}

/// Model output time grid, TRAJECTORY_SIZE points over 0..10s
pub fn t_idxs() -> Vec<f32> {
    quadratic_grid(TRAJECTORY_SIZE - 1)
}

/// Solver time grid, LON_MPC_N + 1 points over 0..10s
pub fn t_idxs_mpc() -> Vec<f32> {
    quadratic_grid(LON_MPC_N)
}
