use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vehicle: VehicleConfig,
    pub lane_change: LaneChangeConfig,
    pub conditional: ConditionalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub steer_ratio: f32,
    pub wheelbase: f32,
    /// Longitudinal control is commanded by this stack (not the stock ACC)
    pub openpilot_longitudinal: bool,
    pub personal_tune: bool,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            steer_ratio: 15.3,
            wheelbase: 2.7,
            openpilot_longitudinal: true,
            personal_tune: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneChangeConfig {
    /// Start the lane change without a steering nudge
    pub nudgeless: bool,
    /// Require a geometrically available lane for nudgeless changes
    pub lane_detection: bool,
    /// Only one nudgeless change per blinker activation
    pub one_lane_change: bool,
}

impl LaneChangeConfig {
    pub fn lane_detection_active(&self) -> bool {
        self.nudgeless && self.lane_detection
    }

    pub fn one_lane_change_active(&self) -> bool {
        self.nudgeless && self.one_lane_change
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalConfig {
    pub enabled: bool,
    pub curves: bool,
    /// Ignore curves while following a lead
    pub curves_lead: bool,
    pub signal: bool,
    pub stop_lights: bool,
    /// Below this speed (mph) with no lead, use the alternate mode. 0 disables.
    pub speed_mph: f32,
    /// Below this speed (mph) with a lead, use the alternate mode. 0 disables.
    pub speed_lead_mph: f32,
}

impl Default for ConditionalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            curves: true,
            curves_lead: false,
            signal: true,
            stop_lights: false,
            speed_mph: 0.0,
            speed_lead_mph: 0.0,
        }
    }
}

impl ConditionalConfig {
    pub fn curves_active(&self) -> bool {
        self.enabled && self.curves
    }

    pub fn curves_lead_active(&self) -> bool {
        self.enabled && self.curves_lead
    }

    pub fn signal_active(&self) -> bool {
        self.enabled && self.signal
    }

    pub fn stop_lights_active(&self) -> bool {
        self.enabled && self.stop_lights
    }

    pub fn speed_thresholds(&self) -> SpeedThresholds {
        SpeedThresholds {
            no_lead_mph: self.speed_mph,
            with_lead_mph: self.speed_lead_mph,
        }
    }
}

/// Low-speed gates for the alternate longitudinal mode, in mph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedThresholds {
    pub no_lead_mph: f32,
    pub with_lead_mph: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// LATERAL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaneChangeState {
    #[default]
    Off,
    PreLaneChange,
    Starting,
    Finishing,
}

impl LaneChangeState {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            LaneChangeState::Off => 0,
            LaneChangeState::PreLaneChange => 1,
            LaneChangeState::Starting => 2,
            LaneChangeState::Finishing => 3,
        }
    }

    pub fn is_idle(self) -> bool {
        matches!(self, LaneChangeState::Off | LaneChangeState::PreLaneChange)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaneChangeDirection {
    #[default]
    None,
    Left,
    Right,
}

impl LaneChangeDirection {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            LaneChangeDirection::None => 0,
            LaneChangeDirection::Left => 1,
            LaneChangeDirection::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Desire {
    #[default]
    None,
    KeepLeft,
    KeepRight,
    LaneChangeLeft,
    LaneChangeRight,
}

impl Desire {
    pub fn is_keep(self) -> bool {
        matches!(self, Desire::KeepLeft | Desire::KeepRight)
    }
}

// ============================================================================
// LONGITUDINAL
// ============================================================================

/// Which longitudinal strategy the solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlannerMode {
    /// Speed-dependent cruise limits
    #[default]
    Acc,
    /// Experimental end-to-end blend with fixed global limits
    Blended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanSource {
    #[default]
    Cruise,
    Lead0,
    Lead1,
    E2e,
}

/// Driver override of the conditional mode decision (steering-wheel button).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ManualOverride {
    #[default]
    None,
    ForceOff,
    ForceOn,
}

/// On-road status code for the conditional mode gate, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionalStatus {
    #[default]
    Idle,
    OverriddenOff,
    OverriddenOn,
    Curve,
    StopLight,
    TurnSignal,
    SpeedNoLead,
    SpeedWithLead,
}

impl ConditionalStatus {
    pub fn code(self) -> u8 {
        match self {
            ConditionalStatus::Idle => 0,
            ConditionalStatus::OverriddenOff => 1,
            ConditionalStatus::OverriddenOn => 2,
            ConditionalStatus::Curve => 3,
            ConditionalStatus::StopLight => 4,
            ConditionalStatus::TurnSignal => 5,
            ConditionalStatus::SpeedNoLead => 6,
            ConditionalStatus::SpeedWithLead => 7,
        }
    }
}
