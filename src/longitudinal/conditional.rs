// src/longitudinal/conditional.rs
//
// Conditional experimental mode: decides each tick whether the longitudinal
// planner should run the blended (experimental) strategy instead of plain
// cruise control.
//
// Sub-signals, evaluated in this order every tick:
//   lead presence   (debounced)
//   curvature       (debounced, hysteresis on the estimate)
//   stop light      (debounced)
//   turn signal     (instant)
//   low speed       (instant, threshold picked by lead presence)
//
// Any true sub-signal switches into the blended mode. Leaving it requires
// all of them false and the car moving. A manual override from the wheel
// latches and forces either mode until the sub-signals agree with it:
// ForceOff holds until nothing is met, ForceOn until something is.

use crate::conversions::{MPH_TO_MS, MS_TO_MPH};
use crate::interp::interp;
use crate::settings::SettingsStore;
use crate::signal::{ModelFrame, SignalFrame};
use crate::types::{ConditionalConfig, ConditionalStatus, ManualOverride, SpeedThresholds};
use serde::Serialize;
use tracing::{debug, info};

// ============================================================================
// DEBOUNCE
// ============================================================================
/// Consecutive raw-true ticks before a sub-signal asserts (0.25s at 20Hz)
pub const DEBOUNCE_THRESHOLD: u8 = 5;
pub const DEBOUNCE_CAP: u8 = 10;

// ============================================================================
// CURVATURE
// ============================================================================
/// Lateral accel (m/s²) at current speed that enters curve mode
const CURVE_ENTER: f32 = 1.6;
/// Lateral accel that keeps curve mode once entered
const CURVE_EXIT: f32 = 1.2;
/// Ignore model samples slower than this when estimating curvature
const CURVATURE_MIN_SPEED: f32 = 1.0;
/// Both ego lane lines must be seen this confidently to trust the path
const LANE_LINE_PROB_MIN: f32 = 0.6;

// ============================================================================
// STOP LIGHT
// ============================================================================
const STOP_DISTANCE_BP_MPH: [f32; 7] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 55.0];
const STOP_DISTANCE_M: [f32; 7] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 110.0];
const STOP_STRAIGHT_ANGLE_DEG: f32 = 10.0;

const TURN_SIGNAL_SPEED_MAX: f32 = 55.0 * MPH_TO_MS;

/// Saturating counter that asserts after DEBOUNCE_THRESHOLD consecutive
/// raw-true ticks. While asserted a false tick only decrements, so release
/// is slower than a single glitch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceCounter {
    count: u8,
    active: bool,
}

impl DebounceCounter {
    pub fn update(&mut self, raw: bool) -> bool {
        if raw {
            self.count = (self.count + 1).min(DEBOUNCE_CAP);
        } else if self.active {
            self.count = self.count.saturating_sub(1);
        } else {
            self.count = 0;
        }
        self.active = self.count >= DEBOUNCE_THRESHOLD;
        self.active
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.active = false;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConditionDecision {
    pub use_alternate: bool,
    pub status: ConditionalStatus,
    pub conditions_met: bool,
}

/// Snapshot of the individual sub-signals from the last evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConditionFlags {
    pub lead: bool,
    pub curve: bool,
    pub stop_light: bool,
    pub turn_signal: bool,
    pub speed_no_lead: bool,
    pub speed_with_lead: bool,
}

impl ConditionFlags {
    pub fn any(&self) -> bool {
        self.curve
            || self.stop_light
            || self.turn_signal
            || self.speed_no_lead
            || self.speed_with_lead
    }
}

pub struct ConditionEvaluator {
    config: ConditionalConfig,
    thresholds: SpeedThresholds,
    thresholds_stale: bool,
    lead: DebounceCounter,
    curve: DebounceCounter,
    stop_light: DebounceCounter,
    override_state: ManualOverride,
    override_reset: bool,
    previous_status: ConditionalStatus,
    pub flags: ConditionFlags,
    pub curvature: f32,
}

impl ConditionEvaluator {
    pub fn new(config: ConditionalConfig) -> Self {
        let thresholds = config.speed_thresholds();
        Self {
            config,
            thresholds,
            thresholds_stale: false,
            lead: DebounceCounter::default(),
            curve: DebounceCounter::default(),
            stop_light: DebounceCounter::default(),
            override_state: ManualOverride::None,
            override_reset: false,
            previous_status: ConditionalStatus::Idle,
            flags: ConditionFlags::default(),
            curvature: 0.0,
        }
    }

    pub fn evaluate(
        &mut self,
        frame: &SignalFrame,
        store: &mut dyn SettingsStore,
    ) -> ConditionDecision {
        self.refresh_thresholds(store);

        let car = &frame.car;
        let lead = self.update_lead(frame.radar.has_lead());
        let curve = self.update_curve(&frame.model, car.v_ego, car.standstill, lead);
        let stop_light = self.update_stop_light(
            &frame.model,
            car.v_ego,
            car.steering_angle_deg,
            car.standstill,
            lead,
        );
        let turn_signal = self.turn_signal(frame.any_blinker(), car.v_ego);
        let (speed_no_lead, speed_with_lead) = self.low_speed(car.v_ego, lead);

        self.flags = ConditionFlags {
            lead,
            curve,
            stop_light,
            turn_signal,
            speed_no_lead,
            speed_with_lead,
        };
        let conditions_met = self.flags.any();

        self.update_override(frame.manual_override, conditions_met, store);

        let current = frame.controls.experimental_mode;
        let use_alternate = match self.override_state {
            ManualOverride::ForceOn => true,
            ManualOverride::ForceOff => false,
            ManualOverride::None => {
                if !current && conditions_met {
                    true
                } else if current && !conditions_met && !car.standstill {
                    false
                } else {
                    current
                }
            }
        };

        if self.override_state == ManualOverride::None && use_alternate != current {
            info!(
                "🧪 Conditional mode {} ({:?})",
                if use_alternate { "ON" } else { "OFF" },
                self.flags
            );
            self.override_reset = false;
            if !use_alternate {
                // Pick up threshold edits made while the mode was active
                self.thresholds_stale = true;
            }
        }

        if !self.override_reset && !conditions_met {
            store.clear_override();
            self.override_reset = true;
        }

        let status = self.status();
        if status != self.previous_status {
            store.put_status(status);
            self.previous_status = status;
        }

        ConditionDecision {
            use_alternate,
            status,
            conditions_met,
        }
    }

    /// A pressed override latches. A latched one is released, and the store
    /// told, once the sub-signals agree with it.
    fn update_override(
        &mut self,
        pressed: ManualOverride,
        conditions_met: bool,
        store: &mut dyn SettingsStore,
    ) {
        if pressed != ManualOverride::None {
            if pressed != self.override_state {
                info!("🎛️ Conditional mode overridden: {:?}", pressed);
            }
            self.override_state = pressed;
            self.override_reset = true;
            return;
        }

        let agrees = match self.override_state {
            ManualOverride::None => return,
            ManualOverride::ForceOff => !conditions_met,
            ManualOverride::ForceOn => conditions_met,
        };
        if agrees {
            info!("🎛️ Conditional override {:?} released", self.override_state);
            self.override_state = ManualOverride::None;
            self.override_reset = true;
            store.clear_override();
        }
    }

    fn refresh_thresholds(&mut self, store: &mut dyn SettingsStore) {
        if !self.thresholds_stale {
            return;
        }
        if let Some(thresholds) = store.speed_thresholds() {
            if thresholds != self.thresholds {
                info!(
                    "🔧 Conditional speed thresholds {:?} → {:?}",
                    self.thresholds, thresholds
                );
            }
            self.thresholds = thresholds;
        }
        self.thresholds_stale = false;
    }

    fn update_lead(&mut self, lead_raw: bool) -> bool {
        self.lead.update(lead_raw)
    }

    fn update_curve(
        &mut self,
        model: &ModelFrame,
        v_ego: f32,
        standstill: bool,
        lead: bool,
    ) -> bool {
        let suppressed = standstill
            || !self.config.curves_active()
            || (self.config.curves_lead_active() && lead);
        if suppressed {
            self.curve.reset();
            self.curvature = 0.0;
            return false;
        }

        self.curvature = road_curvature(model, v_ego);
        let raw = self.curvature >= CURVE_ENTER
            || (self.curve.is_active() && self.curvature > CURVE_EXIT);
        debug!("🌀 Curvature estimate {:.2} (raw={})", self.curvature, raw);
        self.curve.update(raw)
    }

    fn update_stop_light(
        &mut self,
        model: &ModelFrame,
        v_ego: f32,
        steering_angle_deg: f32,
        standstill: bool,
        lead: bool,
    ) -> bool {
        if !self.config.stop_lights_active() || standstill || lead {
            self.stop_light.reset();
            return false;
        }

        let raw = match model.position.x.last() {
            Some(&x_end) if model.valid => {
                let stop_distance = interp(
                    v_ego * MS_TO_MPH,
                    &STOP_DISTANCE_BP_MPH,
                    &STOP_DISTANCE_M,
                );
                steering_angle_deg.abs() < STOP_STRAIGHT_ANGLE_DEG && x_end < stop_distance
            }
            _ => false,
        };
        self.stop_light.update(raw)
    }

    fn turn_signal(&self, any_blinker: bool, v_ego: f32) -> bool {
        self.config.signal_active() && any_blinker && v_ego < TURN_SIGNAL_SPEED_MAX
    }

    /// Zero thresholds disable their gate.
    fn low_speed(&self, v_ego: f32, lead: bool) -> (bool, bool) {
        let below = |mph: f32| mph > 0.0 && v_ego < mph * MPH_TO_MS;
        (
            !lead && below(self.thresholds.no_lead_mph),
            lead && below(self.thresholds.with_lead_mph),
        )
    }

    fn status(&self) -> ConditionalStatus {
        match self.override_state {
            ManualOverride::ForceOff => ConditionalStatus::OverriddenOff,
            ManualOverride::ForceOn => ConditionalStatus::OverriddenOn,
            ManualOverride::None => {
                let f = &self.flags;
                if f.curve {
                    ConditionalStatus::Curve
                } else if f.stop_light {
                    ConditionalStatus::StopLight
                } else if f.turn_signal {
                    ConditionalStatus::TurnSignal
                } else if f.speed_no_lead {
                    ConditionalStatus::SpeedNoLead
                } else if f.speed_with_lead {
                    ConditionalStatus::SpeedWithLead
                } else {
                    ConditionalStatus::Idle
                }
            }
        }
    }

    pub fn override_state(&self) -> ManualOverride {
        self.override_state
    }

    pub fn thresholds(&self) -> SpeedThresholds {
        self.thresholds
    }

    pub fn counters(&self) -> (u8, u8, u8) {
        (self.lead.count(), self.curve.count(), self.stop_light.count())
    }
}

/// Peak lateral acceleration the predicted path would demand at the current
/// speed: max |a_y| / v_x² along the model horizon, times v_ego². Zero
/// unless both ego lane lines are confidently detected.
pub fn road_curvature(model: &ModelFrame, v_ego: f32) -> f32 {
    let lines_seen = model
        .lane_line_probs
        .get(1..3)
        .is_some_and(|probs| probs.iter().all(|&p| p > LANE_LINE_PROB_MIN));
    if !model.valid || !lines_seen {
        return 0.0;
    }
    let a_y = &model.acceleration.y;
    let v_x = &model.velocity.x;
    if a_y.is_empty() || a_y.len() != v_x.len() {
        return 0.0;
    }

    let curvature = a_y
        .iter()
        .zip(v_x)
        .filter(|(_, &v)| v > CURVATURE_MIN_SPEED)
        .map(|(&a, &v)| a.abs() / (v * v))
        .fold(0.0_f32, f32::max);

    curvature * v_ego * v_ego
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn enabled() -> ConditionalConfig {
        ConditionalConfig {
            enabled: true,
            ..Default::default()
        }
    }

    /// Model predicting a constant 20 m/s with constant lateral accel
    fn curved_model(a_y: f32) -> ModelFrame {
        let mut model = ModelFrame {
            valid: true,
            ..Default::default()
        };
        model.velocity.x = vec![20.0; 33];
        model.acceleration.y = vec![a_y; 33];
        model.position.x = (0..33).map(|i| i as f32 * 6.0).collect();
        model.lane_line_probs = vec![0.3, 0.9, 0.9, 0.3];
        model
    }

    fn driving(v_ego: f32) -> SignalFrame {
        let mut frame = SignalFrame::default();
        frame.car.v_ego = v_ego;
        frame.car.cruise_available = true;
        frame.model = curved_model(0.0);
        frame
    }

    #[test]
    fn test_debounce_needs_consecutive_ticks() {
        let mut c = DebounceCounter::default();
        for _ in 0..4 {
            assert!(!c.update(true));
        }
        // Glitch resets while not yet asserted
        assert!(!c.update(false));
        assert_eq!(c.count(), 0);
        for _ in 0..4 {
            assert!(!c.update(true));
        }
        assert!(c.update(true));
    }

    #[test]
    fn test_debounce_bounded_and_releases_slowly() {
        let mut c = DebounceCounter::default();
        for _ in 0..50 {
            c.update(true);
            assert!(c.count() <= DEBOUNCE_CAP);
        }
        assert_eq!(c.count(), DEBOUNCE_CAP);

        // One glitch does not release
        assert!(c.update(false));
        let mut ticks = 1;
        while c.update(false) {
            ticks += 1;
        }
        assert_eq!(ticks, (DEBOUNCE_CAP - DEBOUNCE_THRESHOLD) as usize);
        for _ in 0..20 {
            c.update(false);
        }
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_road_curvature_scales_with_speed() {
        let model = curved_model(2.0);
        assert!((road_curvature(&model, 20.0) - 2.0).abs() < 1e-4);
        assert!((road_curvature(&model, 10.0) - 0.5).abs() < 1e-4);

        let mut bad = curved_model(2.0);
        bad.acceleration.y.pop();
        assert_eq!(road_curvature(&bad, 20.0), 0.0);
        bad = curved_model(2.0);
        bad.valid = false;
        assert_eq!(road_curvature(&bad, 20.0), 0.0);
    }

    #[test]
    fn test_road_curvature_needs_both_ego_lane_lines() {
        let mut model = curved_model(3.0);
        model.lane_line_probs[2] = 0.5;
        assert_eq!(road_curvature(&model, 20.0), 0.0);

        model.lane_line_probs.clear();
        assert_eq!(road_curvature(&model, 20.0), 0.0);

        // Outer lines do not matter
        model.lane_line_probs = vec![0.0, 0.7, 0.7, 0.0];
        assert!(road_curvature(&model, 20.0) > 2.9);

        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(20.0);
        frame.model = curved_model(3.0);
        frame.model.lane_line_probs[1] = 0.2;
        for _ in 0..20 {
            assert!(!eval.evaluate(&frame, &mut store).use_alternate);
        }
        assert_eq!(eval.counters().1, 0);
    }

    #[test]
    fn test_curve_enters_after_debounce_with_hysteresis() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(20.0);
        frame.model = curved_model(2.0);

        for _ in 0..(DEBOUNCE_THRESHOLD - 1) {
            let d = eval.evaluate(&frame, &mut store);
            assert!(!d.use_alternate);
        }
        let d = eval.evaluate(&frame, &mut store);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::Curve);
        frame.controls.experimental_mode = true;

        // Between the watermarks: stays in curve mode
        frame.model = curved_model(1.4);
        for _ in 0..20 {
            let d = eval.evaluate(&frame, &mut store);
            assert!(d.use_alternate);
            assert!(eval.flags.curve);
        }

        // Below the exit watermark: released after the counter drains
        frame.model = curved_model(0.5);
        let mut ticks = 0;
        loop {
            let d = eval.evaluate(&frame, &mut store);
            ticks += 1;
            if !d.use_alternate {
                break;
            }
            assert!(ticks < 20);
        }
        assert!(ticks > 1);
    }

    #[test]
    fn test_curve_between_watermarks_does_not_enter() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(20.0);
        frame.model = curved_model(1.4);
        for _ in 0..30 {
            assert!(!eval.evaluate(&frame, &mut store).use_alternate);
        }
    }

    #[test]
    fn test_curve_suppressed_at_standstill_and_with_lead() {
        let mut eval = ConditionEvaluator::new(ConditionalConfig {
            curves_lead: true,
            ..enabled()
        });
        let mut store = MemorySettings::default();
        let mut frame = driving(20.0);
        frame.model = curved_model(3.0);
        frame.radar.lead_one.status = true;

        for _ in 0..20 {
            eval.evaluate(&frame, &mut store);
        }
        assert!(eval.flags.lead);
        assert!(!eval.flags.curve);

        frame.radar.lead_one.status = false;
        frame.car.standstill = true;
        for _ in 0..20 {
            eval.evaluate(&frame, &mut store);
            assert_eq!(eval.counters().1, 0);
        }
    }

    #[test]
    fn test_counters_stay_in_range() {
        let mut eval = ConditionEvaluator::new(ConditionalConfig {
            stop_lights: true,
            ..enabled()
        });
        let mut store = MemorySettings::default();
        for tick in 0..300 {
            let mut frame = driving(15.0);
            frame.model = curved_model(if tick % 7 < 4 { 3.0 } else { 0.0 });
            frame.radar.lead_one.status = tick % 11 < 6;
            eval.evaluate(&frame, &mut store);
            let (lead, curve, stop) = eval.counters();
            assert!(lead <= DEBOUNCE_CAP && curve <= DEBOUNCE_CAP && stop <= DEBOUNCE_CAP);
        }
    }

    #[test]
    fn test_stop_light_detected_when_path_ends_short() {
        let mut eval = ConditionEvaluator::new(ConditionalConfig {
            stop_lights: true,
            curves: false,
            ..enabled()
        });
        let mut store = MemorySettings::default();
        // 30 mph, braking distance 60m, model path ends at 40m
        let mut frame = driving(30.0 * MPH_TO_MS);
        frame.model.position.x = (0..33).map(|i| i as f32 * 1.25).collect();

        for _ in 0..DEBOUNCE_THRESHOLD {
            eval.evaluate(&frame, &mut store);
        }
        assert!(eval.flags.stop_light);
        assert_eq!(store.status, ConditionalStatus::StopLight);

        // Turning: not a stop light
        let mut eval2 = ConditionEvaluator::new(ConditionalConfig {
            stop_lights: true,
            curves: false,
            ..enabled()
        });
        frame.car.steering_angle_deg = 25.0;
        for _ in 0..10 {
            eval2.evaluate(&frame, &mut store);
        }
        assert!(!eval2.flags.stop_light);
    }

    #[test]
    fn test_turn_signal_below_cutoff() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(15.0);
        frame.car.right_blinker = true;
        let d = eval.evaluate(&frame, &mut store);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::TurnSignal);

        frame.car.v_ego = 30.0;
        let mut eval = ConditionEvaluator::new(enabled());
        assert!(!eval.evaluate(&frame, &mut store).use_alternate);
    }

    #[test]
    fn test_speed_gates_follow_lead() {
        let config = ConditionalConfig {
            speed_mph: 30.0,
            speed_lead_mph: 0.0,
            ..enabled()
        };
        let mut eval = ConditionEvaluator::new(config);
        let mut store = MemorySettings::default();
        let mut frame = driving(10.0);

        let d = eval.evaluate(&frame, &mut store);
        assert_eq!(d.status, ConditionalStatus::SpeedNoLead);

        // With a settled lead and a disabled lead threshold, no speed condition
        frame.radar.lead_one.status = true;
        for _ in 0..DEBOUNCE_THRESHOLD {
            eval.evaluate(&frame, &mut store);
        }
        assert!(eval.flags.lead);
        assert!(!eval.flags.speed_no_lead);
        assert!(!eval.flags.speed_with_lead);
    }

    #[test]
    fn test_speed_with_lead_below_lead_threshold() {
        let mut eval = ConditionEvaluator::new(ConditionalConfig {
            speed_mph: 0.0,
            speed_lead_mph: 30.0,
            ..enabled()
        });
        let mut store = MemorySettings::default();
        let mut frame = driving(10.0);
        frame.radar.lead_one.status = true;

        // Nothing is met until the lead settles
        for _ in 0..(DEBOUNCE_THRESHOLD - 1) {
            assert!(!eval.evaluate(&frame, &mut store).conditions_met);
        }
        let d = eval.evaluate(&frame, &mut store);
        assert!(eval.flags.lead);
        assert!(eval.flags.speed_with_lead);
        assert!(!eval.flags.speed_no_lead);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::SpeedWithLead);
        assert_eq!(store.status.code(), 7);

        // Above the threshold the gate opens
        frame.car.v_ego = 20.0;
        assert!(!eval.evaluate(&frame, &mut store).conditions_met);
    }

    #[test]
    fn test_standstill_holds_alternate_mode() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(0.0);
        frame.car.standstill = true;
        frame.controls.experimental_mode = true;

        let d = eval.evaluate(&frame, &mut store);
        assert!(!d.conditions_met);
        assert!(d.use_alternate);

        frame.car.standstill = false;
        frame.car.v_ego = 20.0;
        assert!(!eval.evaluate(&frame, &mut store).use_alternate);
    }

    #[test]
    fn test_manual_override_forces_mode_and_status() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(15.0);
        frame.car.left_blinker = true;
        frame.manual_override = ManualOverride::ForceOff;

        let d = eval.evaluate(&frame, &mut store);
        assert!(d.conditions_met);
        assert!(!d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::OverriddenOff);

        frame.car.left_blinker = false;
        frame.car.v_ego = 30.0;
        frame.manual_override = ManualOverride::ForceOn;
        let d = eval.evaluate(&frame, &mut store);
        assert!(!d.conditions_met);
        assert!(d.use_alternate);
        assert_eq!(d.status.code(), 2);
    }

    #[test]
    fn test_force_off_held_until_conditions_clear() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(15.0);
        frame.car.left_blinker = true;
        frame.manual_override = ManualOverride::ForceOff;
        assert!(!eval.evaluate(&frame, &mut store).use_alternate);

        // Button released, blinker still on: the override holds
        frame.manual_override = ManualOverride::None;
        for _ in 0..10 {
            let d = eval.evaluate(&frame, &mut store);
            assert!(d.conditions_met);
            assert!(!d.use_alternate);
            assert_eq!(d.status, ConditionalStatus::OverriddenOff);
        }
        assert_eq!(eval.override_state(), ManualOverride::ForceOff);
        assert_eq!(store.override_clears, 0);

        // Blinker off: conditions agree, override released once
        frame.car.left_blinker = false;
        let d = eval.evaluate(&frame, &mut store);
        assert_eq!(d.status, ConditionalStatus::Idle);
        assert_eq!(eval.override_state(), ManualOverride::None);
        eval.evaluate(&frame, &mut store);
        assert_eq!(store.override_clears, 1);

        // Automatic again
        frame.car.left_blinker = true;
        let d = eval.evaluate(&frame, &mut store);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::TurnSignal);
    }

    #[test]
    fn test_force_on_held_until_conditions_met() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(30.0);
        frame.manual_override = ManualOverride::ForceOn;
        assert!(eval.evaluate(&frame, &mut store).use_alternate);

        frame.manual_override = ManualOverride::None;
        frame.controls.experimental_mode = true;
        for _ in 0..10 {
            let d = eval.evaluate(&frame, &mut store);
            assert!(!d.conditions_met);
            assert!(d.use_alternate);
            assert_eq!(d.status, ConditionalStatus::OverriddenOn);
        }
        assert_eq!(store.override_clears, 0);

        frame.car.v_ego = 15.0;
        frame.car.left_blinker = true;
        let d = eval.evaluate(&frame, &mut store);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::TurnSignal);
        assert_eq!(store.override_clears, 1);
        assert_eq!(eval.override_state(), ManualOverride::None);
    }

    #[test]
    fn test_override_cleared_once_when_conditions_clear() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let frame = driving(30.0);
        for _ in 0..5 {
            eval.evaluate(&frame, &mut store);
        }
        assert_eq!(store.override_clears, 1);

        // A mode switch re-arms the reset
        let mut signal = driving(15.0);
        signal.car.left_blinker = true;
        eval.evaluate(&signal, &mut store);
        let mut after = driving(30.0);
        after.controls.experimental_mode = true;
        eval.evaluate(&after, &mut store);
        assert_eq!(store.override_clears, 2);
    }

    #[test]
    fn test_status_written_only_on_change() {
        let mut eval = ConditionEvaluator::new(enabled());
        let mut store = MemorySettings::default();
        let mut frame = driving(15.0);
        frame.car.left_blinker = true;
        for _ in 0..10 {
            eval.evaluate(&frame, &mut store);
        }
        assert_eq!(store.status_writes, 1);
        frame.car.left_blinker = false;
        frame.controls.experimental_mode = true;
        eval.evaluate(&frame, &mut store);
        assert_eq!(store.status_writes, 2);
        assert_eq!(store.status, ConditionalStatus::Idle);
    }

    #[test]
    fn test_thresholds_refreshed_after_switching_off() {
        let mut eval = ConditionEvaluator::new(ConditionalConfig {
            speed_mph: 30.0,
            ..enabled()
        });
        let mut store = MemorySettings {
            thresholds: Some(SpeedThresholds {
                no_lead_mph: 45.0,
                with_lead_mph: 0.0,
            }),
            ..Default::default()
        };

        let mut frame = driving(40.0 * MPH_TO_MS);
        assert!(!eval.evaluate(&frame, &mut store).use_alternate);
        assert_eq!(eval.thresholds().no_lead_mph, 30.0);

        // Switch off happens, next tick re-reads
        frame.controls.experimental_mode = true;
        assert!(!eval.evaluate(&frame, &mut store).use_alternate);
        frame.controls.experimental_mode = false;
        let d = eval.evaluate(&frame, &mut store);
        assert_eq!(eval.thresholds().no_lead_mph, 45.0);
        assert!(d.use_alternate);
        assert_eq!(d.status, ConditionalStatus::SpeedNoLead);
    }
}
