//! Timing fabric for the stepper channels.
//!
//! Each axis owns one hardware timer in CTC/toggle mode: a compare match
//! toggles the STEP line, so one full step is two timer events. This module
//! holds the compare arithmetic and the guard that keeps mid-move compare
//! rewrites glitch-free; the timers themselves are reached through the
//! [`StepTimer`] capability so the motion core never touches a register.

use crate::config::ClockConfig;

/// One hardware timer channel in CTC mode.
///
/// Implementations wrap a concrete timer peripheral. The contract mirrors
/// the classic 16-bit compare timer: a free-running counter resets on
/// compare match, and the match event drives the pulse engine.
/// `set_compare` must only be called from contexts where the platform has
/// masked the timer interrupt (the firmware calls it from the main loop
/// inside its interrupt-exclusion primitive).
pub trait StepTimer {
    /// Start counting from zero.
    fn start(&mut self);

    /// Stop the timer and gate its interrupt.
    fn stop(&mut self);

    /// Load a new compare (half-period) value.
    fn set_compare(&mut self, ticks: u16);

    /// Currently loaded compare value.
    fn compare(&self) -> u16;

    /// Live counter value.
    fn counter(&self) -> u16;

    /// Whether the timer is currently running.
    fn is_running(&self) -> bool;
}

/// Compare-register arithmetic for a clocked stepper channel.
#[derive(Debug, Clone, Copy)]
pub struct StepClock {
    f_cpu_hz: u32,
    prescaler: u32,
}

impl StepClock {
    /// Build from the machine clock configuration.
    pub fn from_config(config: &ClockConfig) -> Self {
        Self {
            f_cpu_hz: config.f_cpu_hz,
            prescaler: config.prescaler.max(1) as u32,
        }
    }

    /// Half-period compare value for a step rate.
    ///
    /// `ticks = f_cpu / (2 · prescaler · rate) − 1`; the factor 2 accounts
    /// for toggle mode needing two compare events per step. Saturates into
    /// the 16-bit compare range; returns `None` for a zero rate.
    pub fn half_period_ticks(&self, steps_per_sec: u32) -> Option<u16> {
        if steps_per_sec == 0 {
            return None;
        }

        let divisor = 2 * self.prescaler as u64 * steps_per_sec as u64;
        let ticks = (self.f_cpu_hz as u64 / divisor).saturating_sub(1);
        Some(ticks.min(u16::MAX as u64).max(1) as u16)
    }

    /// Step rate produced by a compare value. Diagnostic inverse of
    /// [`Self::half_period_ticks`].
    pub fn rate_from_ticks(&self, ticks: u16) -> u32 {
        let period = 2 * self.prescaler as u64 * (ticks as u64 + 1);
        (self.f_cpu_hz as u64 / period) as u32
    }
}

/// Outcome of a guarded compare update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareAction {
    /// Safe to write the new compare value now.
    Apply,
    /// Counter is about to match; keep the old value for one more period.
    Defer,
}

/// Guard against compare-race glitches.
///
/// Writing a compare value below the live counter in CTC mode makes the
/// counter run to overflow before the next match, stretching one step by up
/// to a full timer wrap. The gate refuses updates while the counter sits
/// within `GUARD_TICKS` of the active compare value; deferred updates are
/// retried on the next profiler tick.
pub struct CompareGate;

impl CompareGate {
    /// Counter-to-compare distance below which updates are deferred.
    pub const GUARD_TICKS: u16 = 8;

    /// Decide whether a new compare value can be written now.
    pub fn decide(counter: u16, compare: u16) -> CompareAction {
        let remaining = compare.saturating_sub(counter);
        if remaining <= Self::GUARD_TICKS {
            CompareAction::Defer
        } else {
            CompareAction::Apply
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockConfig;

    fn clock() -> StepClock {
        StepClock::from_config(&ClockConfig {
            f_cpu_hz: 16_000_000,
            prescaler: 8,
        })
    }

    #[test]
    fn test_half_period_for_known_rates() {
        // 16 MHz / (2 * 8 * 1000) - 1 = 999
        assert_eq!(clock().half_period_ticks(1000), Some(999));
        // 16 MHz / (2 * 8 * 8000) - 1 = 124
        assert_eq!(clock().half_period_ticks(8000), Some(124));
    }

    #[test]
    fn test_zero_rate_never_arms() {
        assert_eq!(clock().half_period_ticks(0), None);
    }

    #[test]
    fn test_slow_rate_saturates_to_compare_range() {
        let clock = StepClock::from_config(&ClockConfig {
            f_cpu_hz: 16_000_000,
            prescaler: 1,
        });
        // 10 steps/s wants 799_999 ticks; must clamp into 16 bits
        assert_eq!(clock.half_period_ticks(10), Some(u16::MAX));
    }

    #[test]
    fn test_rate_round_trip() {
        let clock = clock();
        let ticks = clock.half_period_ticks(4000).unwrap();
        let rate = clock.rate_from_ticks(ticks);
        assert!((rate as i64 - 4000).abs() <= 20);
    }

    #[test]
    fn test_compare_gate_defers_near_match() {
        assert_eq!(CompareGate::decide(990, 999), CompareAction::Defer);
        assert_eq!(CompareGate::decide(999, 999), CompareAction::Defer);
        assert_eq!(CompareGate::decide(100, 999), CompareAction::Apply);
    }

    #[test]
    fn test_compare_gate_counter_past_compare() {
        // Counter already beyond compare (race lost): defer, the wrap will
        // resolve it within one period.
        assert_eq!(CompareGate::decide(1200, 999), CompareAction::Defer);
    }
}
