//! Mechanical constraints derived from axis configuration.

use super::axis::AxisConfig;
use super::units::{Millimeters, Steps};

/// Derived mechanical parameters computed from an axis configuration.
///
/// These are computed once at initialization and used for all motion
/// planning. Steps are canonical throughout the motion core; millimetres
/// appear only at this conversion boundary.
#[derive(Debug, Clone)]
pub struct AxisConstraints {
    /// Steps per millimetre of carriage travel.
    pub steps_per_mm: f32,

    /// Maximum step rate in steps per second.
    pub max_speed: u32,

    /// Minimum step rate in steps per second (timer range floor and arming
    /// cadence).
    pub min_speed: u32,

    /// Acceleration in steps per second squared.
    pub acceleration: u32,

    /// Usable travel from the origin in steps.
    pub travel_steps: i32,

    /// Invert DIR pin logic.
    pub invert_direction: bool,
}

impl AxisConstraints {
    /// Compute constraints from an axis configuration.
    pub fn from_config(config: &AxisConfig) -> Self {
        let steps_per_mm = config.steps_per_mm();
        Self {
            steps_per_mm,
            max_speed: config.max_speed.value(),
            min_speed: config.min_speed.value(),
            acceleration: config.acceleration.value(),
            travel_steps: Steps::from_mm(Millimeters(config.travel_mm), steps_per_mm).value(),
            invert_direction: config.invert_direction,
        }
    }

    /// Convert millimetres to steps, rounded to the nearest step.
    #[inline]
    pub fn mm_to_steps(&self, mm: f32) -> i32 {
        Steps::from_mm(Millimeters(mm), self.steps_per_mm).value()
    }

    /// Convert steps to millimetres.
    #[inline]
    pub fn steps_to_mm(&self, steps: i32) -> f32 {
        Steps(steps).to_mm(self.steps_per_mm).value()
    }

    /// Clamp a requested speed ceiling to this axis's hard range.
    #[inline]
    pub fn clamp_speed(&self, speed: u32) -> u32 {
        speed.clamp(self.min_speed, self.max_speed)
    }

    /// Check whether an absolute step target stays inside the workspace.
    #[inline]
    pub fn in_workspace(&self, target: i32) -> bool {
        target >= 0 && target <= self.travel_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{Microsteps, StepsPerSec, StepsPerSecSq};

    fn make_test_config() -> AxisConfig {
        AxisConfig {
            steps_per_revolution: 200,
            microsteps: Microsteps::new(8).unwrap(),
            mm_per_rev: 40.0,
            max_speed: StepsPerSec(8000),
            min_speed: StepsPerSec(500),
            acceleration: StepsPerSecSq(6000),
            invert_direction: false,
            travel_mm: 1000.0,
        }
    }

    #[test]
    fn test_steps_per_mm() {
        let constraints = AxisConstraints::from_config(&make_test_config());
        // 200 * 8 / 40 = 40 steps/mm
        assert!((constraints.steps_per_mm - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_travel_steps() {
        let constraints = AxisConstraints::from_config(&make_test_config());
        assert_eq!(constraints.travel_steps, 40_000);
    }

    #[test]
    fn test_mm_conversion_round_trip() {
        let constraints = AxisConstraints::from_config(&make_test_config());
        let steps = constraints.mm_to_steps(123.5);
        assert_eq!(steps, 4940);
        assert!((constraints.steps_to_mm(steps) - 123.5).abs() < 0.01);
    }

    #[test]
    fn test_clamp_speed() {
        let constraints = AxisConstraints::from_config(&make_test_config());
        assert_eq!(constraints.clamp_speed(20_000), 8000);
        assert_eq!(constraints.clamp_speed(100), 500);
        assert_eq!(constraints.clamp_speed(4000), 4000);
    }

    #[test]
    fn test_workspace_bounds() {
        let constraints = AxisConstraints::from_config(&make_test_config());
        assert!(constraints.in_workspace(0));
        assert!(constraints.in_workspace(40_000));
        assert!(!constraints.in_workspace(-1));
        assert!(!constraints.in_workspace(40_001));
    }
}
