// src/conversions.rs

pub const MPH_TO_MS: f32 = 0.44704;
pub const MS_TO_MPH: f32 = 1.0 / MPH_TO_MS;
pub const KPH_TO_MS: f32 = 1.0 / 3.6;
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
