use crate::types::{Config, VehicleConfig};
use anyhow::{Context, Result};
use std::fs;
use tracing::warn;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {path}"))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {path}"))?;
        Ok(config.validate())
    }

    /// Replace values the planner cannot work with. Zero speed thresholds are
    /// left alone: they mean "sub-signal disabled".
    pub fn validate(mut self) -> Self {
        let defaults = VehicleConfig::default();

        if !(self.vehicle.steer_ratio > 0.0) {
            warn!(
                "⚠️ steer_ratio {} invalid, using {}",
                self.vehicle.steer_ratio, defaults.steer_ratio
            );
            self.vehicle.steer_ratio = defaults.steer_ratio;
        }
        if !(self.vehicle.wheelbase > 0.0) {
            warn!(
                "⚠️ wheelbase {} invalid, using {}",
                self.vehicle.wheelbase, defaults.wheelbase
            );
            self.vehicle.wheelbase = defaults.wheelbase;
        }

        for speed in [
            &mut self.conditional.speed_mph,
            &mut self.conditional.speed_lead_mph,
        ] {
            if !speed.is_finite() || *speed < 0.0 {
                warn!("⚠️ conditional speed {} invalid, disabling", speed);
                *speed = 0.0;
            }
        }

        self
    }
}
