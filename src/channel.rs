//! Stepper channel capability.
//!
//! An axis descriptor bundles the pre-resolved STEP/DIR/ENABLE writers and
//! the timer channel for one axis, so the motion core never mentions pin
//! numbers. Platforms either use [`AxisDriver`] over embedded-hal 1.0 pins
//! or implement [`StepperChannel`] directly against their registers.

use embedded_hal::digital::OutputPin;

use crate::axis::Direction;
use crate::error::MotionError;
use crate::timing::{CompareAction, CompareGate, StepClock, StepTimer};

/// Everything the motion core needs from one stepper channel.
pub trait StepperChannel {
    /// Latch the DIR line. Only called while the channel is disarmed.
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotionError>;

    /// Drive the ENABLE line.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotionError>;

    /// Toggle the STEP line; returns the new logical level. Called from the
    /// timer compare ISR, twice per step.
    fn toggle_step(&mut self) -> Result<bool, MotionError>;

    /// Load the cadence and start pulsing.
    fn arm(&mut self, steps_per_sec: u32) -> Result<(), MotionError>;

    /// Update the cadence of a running channel. Returns `false` when the
    /// write was deferred by the compare guard; the caller retries on the
    /// next tick.
    fn retime(&mut self, steps_per_sec: u32) -> bool;

    /// Stop pulsing and leave STEP low.
    fn disarm(&mut self);

    /// Whether the channel is currently pulsing.
    fn is_armed(&self) -> bool;
}

/// Axis descriptor over embedded-hal pins and a [`StepTimer`].
///
/// ENABLE is treated as active-low (TB6600-style drivers). The horizontal
/// axis wires both slaved motors to this one channel; electrically the two
/// STEP/DIR pairs are paralleled, so the descriptor still sees single pins.
pub struct AxisDriver<STEP, DIR, EN, T>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    T: StepTimer,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    timer: T,
    clock: StepClock,
    invert_direction: bool,
    step_level: bool,
}

impl<STEP, DIR, EN, T> AxisDriver<STEP, DIR, EN, T>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    T: StepTimer,
{
    /// Create a driver. STEP is driven low, ENABLE left disabled.
    pub fn new(
        mut step_pin: STEP,
        dir_pin: DIR,
        mut enable_pin: EN,
        timer: T,
        clock: StepClock,
        invert_direction: bool,
    ) -> Result<Self, MotionError> {
        step_pin.set_low().map_err(|_| MotionError::PinError)?;
        enable_pin.set_high().map_err(|_| MotionError::PinError)?;
        Ok(Self {
            step_pin,
            dir_pin,
            enable_pin,
            timer,
            clock,
            invert_direction,
            step_level: false,
        })
    }

    /// Access the underlying timer (diagnostics).
    pub fn timer(&self) -> &T {
        &self.timer
    }
}

impl<STEP, DIR, EN, T> StepperChannel for AxisDriver<STEP, DIR, EN, T>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    T: StepTimer,
{
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotionError> {
        let pin_high = match direction {
            Direction::Forward => !self.invert_direction,
            Direction::Reverse => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotionError::PinError)
        } else {
            self.dir_pin.set_low().map_err(|_| MotionError::PinError)
        }
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotionError> {
        if enabled {
            self.enable_pin.set_low().map_err(|_| MotionError::PinError)
        } else {
            self.enable_pin.set_high().map_err(|_| MotionError::PinError)
        }
    }

    fn toggle_step(&mut self) -> Result<bool, MotionError> {
        self.step_level = !self.step_level;
        if self.step_level {
            self.step_pin.set_high().map_err(|_| MotionError::PinError)?;
        } else {
            self.step_pin.set_low().map_err(|_| MotionError::PinError)?;
        }
        Ok(self.step_level)
    }

    fn arm(&mut self, steps_per_sec: u32) -> Result<(), MotionError> {
        let Some(ticks) = self.clock.half_period_ticks(steps_per_sec) else {
            return Ok(());
        };
        self.timer.set_compare(ticks);
        self.timer.start();
        Ok(())
    }

    fn retime(&mut self, steps_per_sec: u32) -> bool {
        let Some(ticks) = self.clock.half_period_ticks(steps_per_sec) else {
            return true;
        };

        if !self.timer.is_running() {
            self.timer.set_compare(ticks);
            return true;
        }

        match CompareGate::decide(self.timer.counter(), self.timer.compare()) {
            CompareAction::Apply => {
                self.timer.set_compare(ticks);
                true
            }
            CompareAction::Defer => false,
        }
    }

    fn disarm(&mut self) {
        self.timer.stop();
        let _ = self.step_pin.set_low();
        self.step_level = false;
    }

    fn is_armed(&self) -> bool {
        self.timer.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockConfig;

    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    /// Minimal software timer for driver tests.
    #[derive(Default)]
    struct FakeTimer {
        compare: u16,
        counter: u16,
        running: bool,
    }

    impl StepTimer for FakeTimer {
        fn start(&mut self) {
            self.counter = 0;
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn set_compare(&mut self, ticks: u16) {
            self.compare = ticks;
        }

        fn compare(&self) -> u16 {
            self.compare
        }

        fn counter(&self) -> u16 {
            self.counter
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn clock() -> StepClock {
        StepClock::from_config(&ClockConfig {
            f_cpu_hz: 16_000_000,
            prescaler: 8,
        })
    }

    #[test]
    fn test_direction_pin_polarity() {
        let step = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let dir = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let enable = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut driver =
            AxisDriver::new(step, dir, enable, FakeTimer::default(), clock(), false).unwrap();

        driver.set_direction(Direction::Forward).unwrap();
        driver.set_direction(Direction::Reverse).unwrap();

        let (mut step, mut dir, mut enable) =
            (driver.step_pin, driver.dir_pin, driver.enable_pin);
        step.done();
        dir.done();
        enable.done();
    }

    #[test]
    fn test_inverted_direction_pin_polarity() {
        let step = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let dir = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let enable = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut driver =
            AxisDriver::new(step, dir, enable, FakeTimer::default(), clock(), true).unwrap();

        driver.set_direction(Direction::Forward).unwrap();

        let (mut step, mut dir, mut enable) =
            (driver.step_pin, driver.dir_pin, driver.enable_pin);
        step.done();
        dir.done();
        enable.done();
    }

    #[test]
    fn test_enable_is_active_low() {
        let step = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let dir = PinMock::new(&[]);
        let enable = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut driver =
            AxisDriver::new(step, dir, enable, FakeTimer::default(), clock(), false).unwrap();

        driver.set_enabled(true).unwrap();
        driver.set_enabled(false).unwrap();

        let (mut step, mut dir, mut enable) =
            (driver.step_pin, driver.dir_pin, driver.enable_pin);
        step.done();
        dir.done();
        enable.done();
    }

    #[test]
    fn test_arm_loads_compare_and_starts() {
        let step = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let dir = PinMock::new(&[]);
        let enable = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut driver =
            AxisDriver::new(step, dir, enable, FakeTimer::default(), clock(), false).unwrap();

        driver.arm(1000).unwrap();
        assert!(driver.is_armed());
        assert_eq!(driver.timer().compare(), 999);

        driver.disarm();
        assert!(!driver.is_armed());

        let (mut step, mut dir, mut enable) =
            (driver.step_pin, driver.dir_pin, driver.enable_pin);
        step.done();
        dir.done();
        enable.done();
    }

    #[test]
    fn test_retime_defers_inside_guard_band() {
        let step = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let dir = PinMock::new(&[]);
        let enable = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut driver =
            AxisDriver::new(step, dir, enable, FakeTimer::default(), clock(), false).unwrap();
        driver.arm(1000).unwrap();

        // Counter right below compare: write must be deferred
        driver.timer.counter = driver.timer.compare - 2;
        assert!(!driver.retime(2000));
        assert_eq!(driver.timer.compare(), 999);

        // Counter far from compare: write goes through
        driver.timer.counter = 0;
        assert!(driver.retime(2000));
        assert_eq!(driver.timer.compare(), 499);

        let (mut step, mut dir, mut enable) =
            (driver.step_pin, driver.dir_pin, driver.enable_pin);
        step.done();
        dir.done();
        enable.done();
    }
}
