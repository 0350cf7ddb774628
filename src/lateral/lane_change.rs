// src/lateral/lane_change.rs
//
// Blinker-driven lane change state machine.
//
//   Off ──blinker on──▶ PreLaneChange ──nudge / nudgeless──▶ Starting
//    ▲                      ▲    │                              │ lane lines faded out
//    │                      │    └──blinker off / slow──▶ Off   ▼
//    └────── no blinker ────┴──────── lane lines back ───── Finishing
//
// Any state drops to Off when lateral control is inactive or a change has
// been running longer than LANE_CHANGE_TIME_MAX.

use super::desire::desire_for;
use super::lane_availability::{lane_available, BlinkerSide};
use crate::conversions::MPH_TO_MS;
use crate::signal::SignalFrame;
use crate::types::{Desire, LaneChangeConfig, LaneChangeDirection, LaneChangeState};
use tracing::{debug, info, warn};

// ============================================================================
// THRESHOLDS
// ============================================================================
pub const LANE_CHANGE_SPEED_MIN: f32 = 20.0 * MPH_TO_MS;
/// Ceiling on the non-idle timer (s)
pub const LANE_CHANGE_TIME_MAX: f32 = 10.0;

/// Lane line fade out rate while starting (1/s), 0.5s to fully fade
const LL_PROB_FADE_OUT_RATE: f32 = 2.0;
/// Lane line fade in rate while finishing (1/s)
const LL_PROB_FADE_IN_RATE: f32 = 1.0;
const LL_PROB_FADED_OUT: f32 = 0.01;
const LL_PROB_FADED_IN: f32 = 0.99;
/// Upstream lane change probability below which the change counts as done
const LANE_CHANGE_PROB_DONE: f32 = 0.02;
const KEEP_PULSE_PERIOD: f32 = 1.0;

pub struct LaneChangeStateMachine {
    config: LaneChangeConfig,
    pub state: LaneChangeState,
    pub direction: LaneChangeDirection,
    /// Seconds spent in Starting/Finishing
    pub timer: f32,
    /// Lane line confidence used by the lateral planner, always in [0, 1]
    pub ll_prob: f32,
    keep_pulse_timer: f32,
    prev_one_blinker: bool,
    pub lane_available: bool,
    /// Nudgeless allowance consumed for the current blinker activation
    lane_change_completed: bool,
    pub desire: Desire,
}

impl LaneChangeStateMachine {
    pub fn new(config: LaneChangeConfig) -> Self {
        Self {
            config,
            state: LaneChangeState::Off,
            direction: LaneChangeDirection::None,
            timer: 0.0,
            ll_prob: 1.0,
            keep_pulse_timer: 0.0,
            prev_one_blinker: false,
            lane_available: true,
            lane_change_completed: false,
            desire: Desire::None,
        }
    }

    pub fn update(&mut self, frame: &SignalFrame, dt: f32) -> Desire {
        if dt < 0.0 {
            warn!("⚠️ negative dt {:.3}s, treating as 0", dt);
        }
        let dt = dt.max(0.0);

        let car = &frame.car;
        let one_blinker = frame.one_blinker();
        let below_lane_change_speed = car.v_ego < LANE_CHANGE_SPEED_MIN;

        self.lane_available = self.check_lane_available(frame, one_blinker);

        let prev_state = self.state;

        if !frame.controls.lateral_active || self.timer > LANE_CHANGE_TIME_MAX {
            if self.timer > LANE_CHANGE_TIME_MAX && self.state != LaneChangeState::Off {
                warn!("⏱️ Lane change exceeded {:.0}s, aborting", LANE_CHANGE_TIME_MAX);
            }
            self.state = LaneChangeState::Off;
            self.direction = LaneChangeDirection::None;
        } else {
            match self.state {
                LaneChangeState::Off => {
                    if one_blinker && !self.prev_one_blinker && !below_lane_change_speed {
                        self.state = LaneChangeState::PreLaneChange;
                        self.ll_prob = 1.0;
                    }
                }

                LaneChangeState::PreLaneChange => {
                    self.direction = if car.left_blinker {
                        LaneChangeDirection::Left
                    } else {
                        LaneChangeDirection::Right
                    };

                    let nudged = car.steering_pressed
                        && ((car.steering_torque > 0.0
                            && self.direction == LaneChangeDirection::Left)
                            || (car.steering_torque < 0.0
                                && self.direction == LaneChangeDirection::Right));
                    let nudgeless = self.config.nudgeless
                        && self.lane_available
                        && !self.lane_change_completed;
                    let torque_applied = nudged || nudgeless;

                    let blindspot_detected = (car.left_blindspot
                        && self.direction == LaneChangeDirection::Left)
                        || (car.right_blindspot && self.direction == LaneChangeDirection::Right);

                    if !one_blinker || below_lane_change_speed {
                        self.state = LaneChangeState::Off;
                    } else if torque_applied && !blindspot_detected {
                        self.state = LaneChangeState::Starting;
                        self.lane_change_completed = self.config.one_lane_change_active();
                    } else if torque_applied {
                        debug!("🚫 {:?} blind spot occupied, holding", self.direction);
                    }
                }

                LaneChangeState::Starting => {
                    self.ll_prob = (self.ll_prob - LL_PROB_FADE_OUT_RATE * dt).max(0.0);

                    if frame.lane_change_prob < LANE_CHANGE_PROB_DONE
                        && self.ll_prob < LL_PROB_FADED_OUT
                    {
                        self.state = LaneChangeState::Finishing;
                    }
                }

                LaneChangeState::Finishing => {
                    self.ll_prob = (self.ll_prob + LL_PROB_FADE_IN_RATE * dt).min(1.0);

                    if self.ll_prob > LL_PROB_FADED_IN {
                        self.direction = LaneChangeDirection::None;
                        self.state = if one_blinker {
                            LaneChangeState::PreLaneChange
                        } else {
                            LaneChangeState::Off
                        };
                    }
                }
            }
        }

        if self.state.is_idle() {
            self.timer = 0.0;
        } else {
            self.timer += dt;
        }

        self.prev_one_blinker = one_blinker;
        if !one_blinker {
            self.lane_change_completed = false;
        }

        if self.state != prev_state {
            info!(
                "↔️ Lane change {:?} → {:?} ({:?})",
                prev_state, self.state, self.direction
            );
        }

        self.desire = desire_for(self.direction, self.state);
        self.apply_keep_pulse(dt);
        self.desire
    }

    /// Keep desires pulse once per second while waiting in PreLaneChange
    /// instead of being held continuously.
    fn apply_keep_pulse(&mut self, dt: f32) {
        match self.state {
            LaneChangeState::Off | LaneChangeState::Starting => self.keep_pulse_timer = 0.0,
            LaneChangeState::PreLaneChange => {
                self.keep_pulse_timer += dt;
                if self.keep_pulse_timer > KEEP_PULSE_PERIOD {
                    self.keep_pulse_timer = 0.0;
                } else if self.desire.is_keep() {
                    self.desire = Desire::None;
                }
            }
            LaneChangeState::Finishing => {}
        }
    }

    fn check_lane_available(&self, frame: &SignalFrame, one_blinker: bool) -> bool {
        if !self.config.lane_detection_active() || !one_blinker {
            return true;
        }
        let side = if frame.car.left_blinker {
            BlinkerSide::Left
        } else {
            BlinkerSide::Right
        };
        lane_available(&frame.model, side)
    }

    pub fn keep_pulse_timer(&self) -> f32 {
        self.keep_pulse_timer
    }
}
