//! # gantry-motion
//!
//! Firmware core for a two-axis Cartesian gantry with embedded-hal 1.0
//! support: step-pulse generation, trapezoidal motion profiling,
//! coordinated two-axis moves, end-switch supervision and the framed
//! serial command protocol that binds them.
//!
//! ## Features
//!
//! - **Configuration-driven**: axes, servos and gripper defined in TOML
//! - **embedded-hal 1.0**: `OutputPin`/`InputPin` for pins, `SetDutyCycle`
//!   for the servo PWM; timers and EEPROM behind crate capabilities
//! - **no_std compatible**: the core runs without the standard library
//! - **ISR/main-loop split**: bounded ISR entry points plus a non-blocking
//!   `poll`, matching a bare-metal superloop target
//! - **Position tracking**: signed 32-bit step counters, steps canonical
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gantry_motion::{Gantry, load_config};
//!
//! let config = load_config("gantry.toml")?;
//! let mut gantry = Gantry::new(
//!     &config,
//!     h_channel, v_channel,   // StepperChannel per axis
//!     limit_inputs,           // four end-switch pins
//!     servo_bank,             // two PWM channels
//!     gripper_coils,          // four coil pins
//!     eeprom,                 // NvStore
//! )?;
//!
//! // RX ISR:    gantry.on_rx_byte(byte);
//! // tick ISR:  gantry.on_tick_isr();
//! // timer ISRs: gantry.on_h_timer(); gantry.on_v_timer();
//! loop {
//!     gantry.poll();
//!     while let Some(line) = gantry.pop_reply() {
//!         serial.write(line.as_bytes());
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod actuators;
pub mod axis;
pub mod channel;
pub mod config;
pub mod encoder;
pub mod error;
pub mod limits;
pub mod machine;
pub mod motion;
pub mod persist;
pub mod protocol;
pub mod timing;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisId, AxisSnapshot, AxisState, Direction};
pub use channel::{AxisDriver, StepperChannel};
pub use config::{validate_config, AxisConfig, MachineConfig};
pub use error::{Error, Result};
pub use limits::{LimitInputs, LimitSample, LimitSense, LimitState, LimitSupervisor};
pub use machine::Gantry;
pub use motion::{MotionProfile, ProfilePhase, StepEvent};
pub use persist::{MemoryStore, NvStore, PersistedState};
pub use protocol::{Command, FrameDecoder, Outbox};
pub use timing::{StepClock, StepTimer};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Microsteps, Millimeters, Steps, StepsPerSec, StepsPerSecSq};
