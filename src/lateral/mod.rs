// src/lateral/mod.rs
//
// Lateral intent: turns blinker, torque, blind spot and lane geometry
// signals into a Desire for the downstream lateral planner.

pub mod desire;
pub mod lane_availability;
pub mod lane_change;

pub use desire::desire_for;
pub use lane_availability::{lane_available, BlinkerSide, MIN_LANE_WIDTH};
pub use lane_change::{LaneChangeStateMachine, LANE_CHANGE_SPEED_MIN, LANE_CHANGE_TIME_MAX};
