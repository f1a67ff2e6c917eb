//! Servo arm and gripper configuration from TOML.

use serde::Deserialize;

/// Pulse-width calibration and angle clamps for one servo channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ServoChannelConfig {
    /// Pulse width at 0°, in microseconds.
    #[serde(default = "default_pulse_min")]
    pub pulse_min_us: u16,

    /// Pulse width at 180°, in microseconds.
    #[serde(default = "default_pulse_max")]
    pub pulse_max_us: u16,

    /// Smallest commandable angle in degrees.
    #[serde(default = "default_min_angle")]
    pub min_angle: u8,

    /// Largest commandable angle in degrees.
    #[serde(default = "default_max_angle")]
    pub max_angle: u8,
}

fn default_pulse_min() -> u16 {
    750
}

fn default_pulse_max() -> u16 {
    2250
}

fn default_min_angle() -> u8 {
    10
}

fn default_max_angle() -> u8 {
    160
}

impl Default for ServoChannelConfig {
    fn default() -> Self {
        Self {
            pulse_min_us: default_pulse_min(),
            pulse_max_us: default_pulse_max(),
            min_angle: default_min_angle(),
            max_angle: default_max_angle(),
        }
    }
}

/// Configuration for the two-servo arm.
#[derive(Debug, Clone, Deserialize)]
pub struct ServoConfig {
    /// Angle both servos adopt on `RA` and on first boot.
    #[serde(default = "default_neutral_angle")]
    pub neutral_angle: u8,

    /// Upper clamp for the interpolation time of an `A` command.
    #[serde(default = "default_max_move_time")]
    pub max_move_time_ms: u16,

    /// Shoulder servo channel.
    #[serde(default)]
    pub shoulder: ServoChannelConfig,

    /// Elbow servo channel.
    #[serde(default)]
    pub elbow: ServoChannelConfig,
}

fn default_neutral_angle() -> u8 {
    90
}

fn default_max_move_time() -> u16 {
    10_000
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            neutral_angle: default_neutral_angle(),
            max_move_time_ms: default_max_move_time(),
            shoulder: ServoChannelConfig::default(),
            elbow: ServoChannelConfig::default(),
        }
    }
}

/// Configuration for the unipolar gripper stepper.
#[derive(Debug, Clone, Deserialize)]
pub struct GripperConfig {
    /// Half-steps from fully open to fully closed.
    #[serde(default = "default_steps_to_close")]
    pub steps_to_close: u16,

    /// Profile ticks between half-steps. Larger is slower.
    #[serde(default = "default_ticks_per_step")]
    pub ticks_per_step: u16,
}

fn default_steps_to_close() -> u16 {
    300
}

fn default_ticks_per_step() -> u16 {
    2
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            steps_to_close: default_steps_to_close(),
            ticks_per_step: default_ticks_per_step(),
        }
    }
}
