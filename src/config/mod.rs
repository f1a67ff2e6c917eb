//! Configuration module for gantry-motion.
//!
//! Provides types for loading and validating the machine configuration from
//! TOML files (with `std` feature) or pre-parsed data.

mod actuators;
mod axis;
#[cfg(feature = "std")]
mod loader;
mod machine;
mod mechanical;
pub mod units;
mod validation;

pub use actuators::{GripperConfig, ServoChannelConfig, ServoConfig};
pub use axis::AxisConfig;
pub use machine::{ClockConfig, MachineConfig, TickConfig};
pub use mechanical::AxisConstraints;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Microsteps, Millimeters, Steps, StepsPerSec, StepsPerSecSq};
