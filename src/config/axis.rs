//! Per-axis configuration from TOML.

use serde::Deserialize;

use super::units::{Microsteps, StepsPerSec, StepsPerSecSq};

/// Complete configuration for one linear axis.
///
/// The horizontal axis drives two mechanically slaved motors from a single
/// timer channel; the motion core treats them as one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Base steps per motor revolution (typically 200 for 1.8° motors).
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u16,

    /// Microstep divisor set on the driver's DIP switches (power of two,
    /// 1 through 32).
    pub microsteps: Microsteps,

    /// Millimetres of carriage travel per motor revolution (belt pitch
    /// circumference or leadscrew lead).
    #[serde(rename = "mm_per_revolution")]
    pub mm_per_rev: f32,

    /// Maximum step rate in steps per second.
    #[serde(rename = "max_speed_steps_per_sec")]
    pub max_speed: StepsPerSec,

    /// Minimum step rate in steps per second. Keeps the pulse timer period
    /// inside its hardware range; also the arming cadence of a new move.
    #[serde(rename = "min_speed_steps_per_sec", default = "default_min_speed")]
    pub min_speed: StepsPerSec,

    /// Acceleration in steps per second squared.
    #[serde(rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSq,

    /// Invert DIR pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Usable travel from the origin switch, in millimetres.
    pub travel_mm: f32,
}

fn default_steps_per_revolution() -> u16 {
    200
}

fn default_min_speed() -> StepsPerSec {
    StepsPerSec(500)
}

impl AxisConfig {
    /// Total steps per output revolution (base steps × microsteps).
    pub fn total_steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution as u32 * self.microsteps.value() as u32
    }

    /// Steps per millimetre of carriage travel.
    pub fn steps_per_mm(&self) -> f32 {
        self.total_steps_per_revolution() as f32 / self.mm_per_rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn belt_axis() -> AxisConfig {
        AxisConfig {
            steps_per_revolution: 200,
            microsteps: Microsteps::new(8).unwrap(),
            mm_per_rev: 40.0,
            max_speed: StepsPerSec(8000),
            min_speed: StepsPerSec(500),
            acceleration: StepsPerSecSq(6000),
            invert_direction: false,
            travel_mm: 1200.0,
        }
    }

    #[test]
    fn test_total_steps() {
        // 200 * 8 = 1600
        assert_eq!(belt_axis().total_steps_per_revolution(), 1600);
    }

    #[test]
    fn test_steps_per_mm() {
        // 1600 / 40 = 40 steps/mm
        assert!((belt_axis().steps_per_mm() - 40.0).abs() < 0.001);
    }
}
