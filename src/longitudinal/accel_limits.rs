// src/longitudinal/accel_limits.rs
//
// Acceleration bounds for the solver: speed-dependent cruise tables in the
// primary mode, fixed global bounds in the blended mode, then a total
// acceleration budget that trades longitudinal for lateral in turns.

use crate::conversions::DEG_TO_RAD;
use crate::interp::{clip, interp};
use crate::types::{PlannerMode, VehicleConfig};
use serde::Serialize;

// ============================================================================
// CRUISE TABLES
// ============================================================================
pub const A_CRUISE_MIN: f32 = -1.2;
pub const A_CRUISE_MAX_BP: [f32; 4] = [0.0, 10.0, 25.0, 40.0];
pub const A_CRUISE_MAX_VALS: [f32; 4] = [1.6, 1.2, 0.8, 0.6];
pub const A_CRUISE_MAX_VALS_PERSONAL_TUNE: [f32; 4] = [1.6, 2.0, 1.2, 1.0];
pub const A_CRUISE_MIN_VALS_PERSONAL_TUNE: [f32; 4] = [-1.2, -1.0, -0.9, -0.8];

/// Solver-wide bounds, used as-is in the blended mode
pub const MIN_ACCEL: f32 = -3.5;
pub const MAX_ACCEL: f32 = 2.0;

// ============================================================================
// TURN BUDGET
// ============================================================================
const A_TOTAL_MAX_BP: [f32; 2] = [20.0, 40.0];
const A_TOTAL_MAX_V: [f32; 2] = [1.7, 3.2];

/// Margin kept around the previous accepted accel so the solver never
/// starts outside its own bounds
pub const PREV_ACCEL_MARGIN: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelLimits {
    pub min: f32,
    pub max: f32,
}

impl AccelLimits {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clip(&self, a: f32) -> f32 {
        clip(a, self.min, self.max)
    }

    /// Widen the bounds so they bracket `a_prev` by `margin` on each side.
    pub fn straddle(self, a_prev: f32, margin: f32) -> Self {
        Self {
            min: self.min.min(a_prev + margin),
            max: self.max.max(a_prev - margin),
        }
    }
}

pub fn max_accel(v_ego: f32, personal_tune: bool) -> f32 {
    if personal_tune {
        interp(v_ego, &A_CRUISE_MAX_BP, &A_CRUISE_MAX_VALS_PERSONAL_TUNE)
    } else {
        interp(v_ego, &A_CRUISE_MAX_BP, &A_CRUISE_MAX_VALS)
    }
}

pub fn min_accel(v_ego: f32, personal_tune: bool) -> f32 {
    if personal_tune {
        interp(v_ego, &A_CRUISE_MAX_BP, &A_CRUISE_MIN_VALS_PERSONAL_TUNE)
    } else {
        A_CRUISE_MIN
    }
}

/// Longitudinal accel still allowed once the lateral accel implied by the
/// steering angle is taken out of the total budget. Never negative.
pub fn turn_accel_cap(v_ego: f32, steering_angle_deg: f32, vehicle: &VehicleConfig) -> f32 {
    let a_total_max = interp(v_ego, &A_TOTAL_MAX_BP, &A_TOTAL_MAX_V);
    let a_y = v_ego * v_ego * steering_angle_deg * DEG_TO_RAD
        / (vehicle.steer_ratio * vehicle.wheelbase);
    (a_total_max * a_total_max - a_y * a_y).max(0.0).sqrt()
}

/// Raw limits before and after turn clipping.
#[derive(Debug, Clone, Copy)]
pub struct LimitSet {
    /// Table or global bounds
    pub cruise: AccelLimits,
    /// Bounds with the turn budget applied to the maximum
    pub turns: AccelLimits,
}

pub fn limits(
    v_ego: f32,
    steering_angle_deg: f32,
    mode: PlannerMode,
    vehicle: &VehicleConfig,
) -> LimitSet {
    match mode {
        PlannerMode::Acc => {
            let cruise = AccelLimits::new(
                min_accel(v_ego, vehicle.personal_tune),
                max_accel(v_ego, vehicle.personal_tune),
            );
            let cap = turn_accel_cap(v_ego, steering_angle_deg, vehicle);
            LimitSet {
                cruise,
                turns: AccelLimits::new(cruise.min, cruise.max.min(cap)),
            }
        }
        PlannerMode::Blended => {
            let global = AccelLimits::new(MIN_ACCEL, MAX_ACCEL);
            LimitSet {
                cruise: global,
                turns: global,
            }
        }
    }
}
