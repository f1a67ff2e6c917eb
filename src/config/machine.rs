//! Machine configuration - root configuration structure.

use serde::Deserialize;

use super::actuators::{GripperConfig, ServoConfig};
use super::axis::AxisConfig;

/// Timer clocking shared by the stepper channels.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClockConfig {
    /// CPU clock in Hz.
    #[serde(default = "default_f_cpu")]
    pub f_cpu_hz: u32,

    /// Prescaler feeding the stepper timers.
    #[serde(default = "default_prescaler")]
    pub prescaler: u16,
}

fn default_f_cpu() -> u32 {
    16_000_000
}

fn default_prescaler() -> u16 {
    8
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            f_cpu_hz: default_f_cpu(),
            prescaler: default_prescaler(),
        }
    }
}

/// Periodic profile tick configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TickConfig {
    /// Tick rate in Hz. Paces profiler updates, limit polling and the
    /// auxiliary actuators. Valid range 100-500.
    #[serde(default = "default_tick_rate")]
    pub rate_hz: u16,
}

fn default_tick_rate() -> u16 {
    500
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_tick_rate(),
        }
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// Horizontal (gantry) axis.
    pub horizontal: AxisConfig,

    /// Vertical (leadscrew) axis.
    pub vertical: AxisConfig,

    /// Timer clocking.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Profile tick.
    #[serde(default)]
    pub tick: TickConfig,

    /// Two-servo arm.
    #[serde(default)]
    pub servos: ServoConfig,

    /// Unipolar gripper.
    #[serde(default)]
    pub gripper: GripperConfig,
}

impl MachineConfig {
    /// Milliseconds covered by one profile tick, rounded down.
    pub fn ms_per_tick(&self) -> u32 {
        1000 / self.tick.rate_hz.max(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let clock = ClockConfig::default();
        assert_eq!(clock.f_cpu_hz, 16_000_000);
        assert_eq!(clock.prescaler, 8);

        let tick = TickConfig::default();
        assert_eq!(tick.rate_hz, 500);
    }
}
