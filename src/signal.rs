// src/signal.rs
//
// Per-tick snapshot of every input the core reads. Assembled once by the
// caller before the tick runs; nothing in here is mutated by the planners.

use crate::types::ManualOverride;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalFrame {
    pub car: CarState,
    pub controls: ControlsState,
    pub model: ModelFrame,
    pub radar: RadarState,
    /// Upstream probability that a lane change is still in progress (0..1)
    pub lane_change_prob: f32,
    pub manual_override: ManualOverride,
    /// Monotonic timestamp of the model frame this tick was built from
    pub model_mono_time: u64,
}

impl SignalFrame {
    pub fn one_blinker(&self) -> bool {
        self.car.left_blinker != self.car.right_blinker
    }

    pub fn any_blinker(&self) -> bool {
        self.car.left_blinker || self.car.right_blinker
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarState {
    pub v_ego: f32,
    pub a_ego: f32,
    pub steering_angle_deg: f32,
    /// Positive is a left turn request
    pub steering_torque: f32,
    pub steering_pressed: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub standstill: bool,
    pub cruise_available: bool,
    pub valid: bool,
}

impl Default for CarState {
    fn default() -> Self {
        Self {
            v_ego: 0.0,
            a_ego: 0.0,
            steering_angle_deg: 0.0,
            steering_torque: 0.0,
            steering_pressed: false,
            left_blinker: false,
            right_blinker: false,
            left_blindspot: false,
            right_blindspot: false,
            standstill: false,
            cruise_available: false,
            valid: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsState {
    pub enabled: bool,
    pub long_control_off: bool,
    pub lateral_active: bool,
    pub experimental_mode: bool,
    /// Set speed in kph
    pub v_cruise_kph: f32,
    pub force_decel: bool,
    pub valid: bool,
}

impl Default for ControlsState {
    fn default() -> Self {
        Self {
            enabled: false,
            long_control_off: true,
            lateral_active: false,
            experimental_mode: false,
            v_cruise_kph: 0.0,
            force_decel: false,
            valid: true,
        }
    }
}

/// A model curve as parallel x (forward) / y (lateral) samples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyline {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl Polyline {
    pub fn is_well_formed(&self) -> bool {
        !self.x.is_empty() && self.x.len() == self.y.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XyzTrajectory {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFrame {
    pub valid: bool,
    pub position: XyzTrajectory,
    pub velocity: XyzTrajectory,
    pub acceleration: XyzTrajectory,
    /// Far left, left, right, far right
    pub lane_lines: Vec<Polyline>,
    pub lane_line_probs: Vec<f32>,
    /// Left edge, right edge
    pub road_edges: Vec<Polyline>,
    /// Speed estimate from the temporal pose head; [0] is forward speed
    pub temporal_pose_trans: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadState {
    pub status: bool,
    pub d_rel: f32,
    pub v_lead: f32,
    pub a_lead: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarState {
    pub lead_one: LeadState,
    pub lead_two: LeadState,
    pub valid: bool,
}

impl Default for RadarState {
    fn default() -> Self {
        Self {
            lead_one: LeadState::default(),
            lead_two: LeadState::default(),
            valid: true,
        }
    }
}

impl RadarState {
    /// Lead presence as the planner should see it; stale radar reports none
    pub fn has_lead(&self) -> bool {
        self.valid && self.lead_one.status
    }
}
