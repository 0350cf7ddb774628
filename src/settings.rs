// src/settings.rs
//
// Capability handed to the conditional mode gate for everything it used to
// reach through global parameter storage: writing the on-road status code,
// clearing the driver override, and re-reading the speed thresholds.

use crate::types::{Config, ConditionalStatus, SpeedThresholds};
use anyhow::Result;
use tracing::{info, warn};

pub trait SettingsStore {
    /// Called only when the status code changes
    fn put_status(&mut self, status: ConditionalStatus);

    /// Forget the driver's manual override once conditions have cleared
    fn clear_override(&mut self);

    /// Fresh speed thresholds, or None to keep the current ones
    fn speed_thresholds(&mut self) -> Option<SpeedThresholds>;
}

/// In-process store. Records what was written so callers can display it.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    pub status: ConditionalStatus,
    pub status_writes: u32,
    pub override_clears: u32,
    pub thresholds: Option<SpeedThresholds>,
}

impl SettingsStore for MemorySettings {
    fn put_status(&mut self, status: ConditionalStatus) {
        self.status = status;
        self.status_writes += 1;
    }

    fn clear_override(&mut self) {
        self.override_clears += 1;
    }

    fn speed_thresholds(&mut self) -> Option<SpeedThresholds> {
        self.thresholds
    }
}

/// Store backed by the YAML config file; thresholds are re-read on request
/// so edits made mid-drive are picked up after the next mode switch.
pub struct FileSettings {
    path: String,
    pub status: ConditionalStatus,
}

impl FileSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ConditionalStatus::Idle,
        }
    }

    fn read_thresholds(&self) -> Result<SpeedThresholds> {
        let config = Config::load(&self.path)?;
        Ok(config.conditional.speed_thresholds())
    }
}

impl SettingsStore for FileSettings {
    fn put_status(&mut self, status: ConditionalStatus) {
        info!("🚦 Conditional status {:?} ({})", status, status.code());
        self.status = status;
    }

    fn clear_override(&mut self) {
        info!("🔄 Conditional override cleared");
    }

    fn speed_thresholds(&mut self) -> Option<SpeedThresholds> {
        match self.read_thresholds() {
            Ok(thresholds) => Some(thresholds),
            Err(e) => {
                warn!("⚠️ Could not refresh speed thresholds: {:#}", e);
                None
            }
        }
    }
}
