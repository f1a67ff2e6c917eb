//! Unit types for physical quantities.
//!
//! Provides type-safe representations of millimetres, step positions, step
//! rates and microstep divisors to prevent unit confusion at compile time.
//! The firmware plans in step-space; millimetres exist only at the host
//! boundary.

use core::ops::{Add, Mul, Sub};

use serde::Deserialize;

use crate::error::ConfigError;

/// Linear position or distance in millimetres.
///
/// Used for configuration and the host-facing `M` command. Internally
/// converted to [`Steps`] per axis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Step cadence in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSec(pub u32);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Mul<u32> for StepsPerSec {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Step acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSecSq(pub u32);

impl StepsPerSecSq {
    /// Create a new StepsPerSecSq value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Axis position in steps (absolute from origin).
///
/// Signed 32 bits: the pulse ISR owns the live counter, everything else reads
/// snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Get absolute value as u32.
    #[inline]
    pub fn abs(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Convert to millimetres using the axis steps-per-mm ratio.
    #[inline]
    pub fn to_mm(self, steps_per_mm: f32) -> Millimeters {
        Millimeters(self.0 as f32 / steps_per_mm)
    }

    /// Create from millimetres using the axis steps-per-mm ratio.
    #[inline]
    pub fn from_mm(mm: Millimeters, steps_per_mm: f32) -> Self {
        Self(libm::roundf(mm.0 * steps_per_mm) as i32)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Microstep divisor as set on the driver's DIP switches.
///
/// The TB6600-class drivers on this machine offer power-of-two divisors up
/// to 32. The divisor scales steps-per-mm, so a value that disagrees with
/// the switches silently rescales the whole workspace; it is validated at
/// the configuration boundary instead of trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Microsteps(u16);

impl Microsteps {
    /// Largest divisor the drivers expose.
    pub const MAX_DIVISOR: u16 = 32;

    /// Validate a divisor against what the drivers can actually be set to.
    pub fn new(divisor: u16) -> Result<Self, ConfigError> {
        if divisor.is_power_of_two() && divisor <= Self::MAX_DIVISOR {
            Ok(Self(divisor))
        } else {
            Err(ConfigError::InvalidMicrosteps(divisor))
        }
    }

    /// The raw divisor.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl Default for Microsteps {
    // The machine ships with the drivers strapped to 1/8 step
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<u16> for Microsteps {
    type Error = ConfigError;

    fn try_from(divisor: u16) -> Result<Self, Self::Error> {
        Self::new(divisor)
    }
}

impl<'de> Deserialize<'de> for Microsteps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let divisor = u16::deserialize(deserializer)?;
        Microsteps::new(divisor).map_err(|_| {
            serde::de::Error::invalid_value(
                serde::de::Unexpected::Unsigned(divisor as u64),
                &"a power-of-two microstep divisor no larger than 32",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microsteps_accepts_driver_settings() {
        for divisor in [1, 2, 4, 8, 16, 32] {
            assert!(Microsteps::new(divisor).is_ok());
        }
    }

    #[test]
    fn test_microsteps_rejects_what_the_switches_cannot_do() {
        assert!(Microsteps::new(0).is_err());
        assert!(Microsteps::new(3).is_err());
        assert!(Microsteps::new(17).is_err());
        // Power of two, but beyond the driver's switch range
        assert!(Microsteps::new(64).is_err());
    }

    #[test]
    fn test_microsteps_default_matches_shipped_strapping() {
        assert_eq!(Microsteps::default().value(), 8);
    }

    #[test]
    fn test_steps_mm_round_trip() {
        // 200 steps/rev * 8 microsteps over a 40 mm belt = 40 steps/mm
        let steps_per_mm = 1600.0 / 40.0;
        let steps = Steps::from_mm(Millimeters(100.0), steps_per_mm);
        assert_eq!(steps.value(), 4000);

        let mm = steps.to_mm(steps_per_mm);
        assert!((mm.value() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_from_mm_rounds_to_nearest() {
        let steps = Steps::from_mm(Millimeters(0.26), 40.0);
        assert_eq!(steps.value(), 10); // 10.4 rounds down

        let steps = Steps::from_mm(Millimeters(-0.26), 40.0);
        assert_eq!(steps.value(), -10);
    }
}
