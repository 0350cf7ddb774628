// src/lib.rs
//
// Decision core of a driver-assistance stack: lane change intent on the
// lateral side, acceleration planning and the conditional experimental
// mode gate on the longitudinal side.

pub mod config;
pub mod conversions;
pub mod filter;
pub mod interp;
pub mod lateral;
pub mod longitudinal;
pub mod pipeline;
pub mod settings;
pub mod signal;
pub mod types;

pub use pipeline::{DrivingCore, TickOutput};
pub use signal::SignalFrame;
pub use types::Config;
