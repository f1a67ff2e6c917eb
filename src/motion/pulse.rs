//! Step pulse engine.
//!
//! The body of each stepper timer ISR. Every compare match toggles the STEP
//! line through the channel; rising edges advance the axis position counter
//! and run the arrival test. The engine stops its own timer the instant the
//! target is reached, so the worst-case ISR path is one toggle, one compare
//! and one counter update.

use crate::axis::{Axis, Direction};
use crate::channel::StepperChannel;
use crate::error::MotionError;

/// What a single timer event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepEvent {
    /// Falling edge or spurious event; no position change.
    None,
    /// One step taken, move still in flight.
    Stepped,
    /// Target reached; timer disarmed, completion flag raised.
    Arrived,
}

impl Axis {
    /// Timer compare ISR body for this axis.
    ///
    /// The direction is latched before arming and never changes while the
    /// timer runs, so the counter update needs no synchronization beyond
    /// running inside the ISR itself.
    pub fn on_timer_event<C: StepperChannel>(
        &mut self,
        channel: &mut C,
    ) -> Result<StepEvent, MotionError> {
        if !self.is_moving() {
            // Late event after a stop raced the timer gate
            channel.disarm();
            return Ok(StepEvent::None);
        }

        let level = channel.toggle_step()?;
        if !level {
            return Ok(StepEvent::None);
        }

        self.current_position += self.direction.sign();

        let delta = self.target_position - self.current_position;
        let arrived = delta == 0 || Direction::from_delta(delta) != self.direction;
        if arrived {
            channel.disarm();
            self.finish_move();
            return Ok(StepEvent::Arrived);
        }

        Ok(StepEvent::Stepped)
    }

    /// Abort any in-flight motion on this axis: disarm the timer, reset the
    /// profile and raise the completion flag with the position left where
    /// the last pulse put it. No deceleration is attempted.
    pub fn abort<C: StepperChannel>(&mut self, channel: &mut C) {
        channel.disarm();
        if self.is_moving() {
            self.finish_move();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisId;
    use crate::config::units::{Microsteps, StepsPerSec, StepsPerSecSq};
    use crate::config::{AxisConfig, AxisConstraints};
    use crate::motion::MotionProfile;

    /// Recording channel: counts rising edges, tracks armed state.
    #[derive(Default)]
    struct TestChannel {
        level: bool,
        armed: bool,
        rising_edges: u32,
        last_rate: u32,
    }

    impl StepperChannel for TestChannel {
        fn set_direction(&mut self, _direction: Direction) -> Result<(), MotionError> {
            Ok(())
        }

        fn set_enabled(&mut self, _enabled: bool) -> Result<(), MotionError> {
            Ok(())
        }

        fn toggle_step(&mut self) -> Result<bool, MotionError> {
            self.level = !self.level;
            if self.level {
                self.rising_edges += 1;
            }
            Ok(self.level)
        }

        fn arm(&mut self, steps_per_sec: u32) -> Result<(), MotionError> {
            self.last_rate = steps_per_sec;
            self.armed = true;
            Ok(())
        }

        fn retime(&mut self, steps_per_sec: u32) -> bool {
            self.last_rate = steps_per_sec;
            true
        }

        fn disarm(&mut self) {
            self.armed = false;
            self.level = false;
        }

        fn is_armed(&self) -> bool {
            self.armed
        }
    }

    fn test_axis() -> Axis {
        let config = AxisConfig {
            steps_per_revolution: 200,
            microsteps: Microsteps::new(8).unwrap(),
            mm_per_rev: 40.0,
            max_speed: StepsPerSec(8000),
            min_speed: StepsPerSec(500),
            acceleration: StepsPerSecSq(6000),
            invert_direction: false,
            travel_mm: 1000.0,
        };
        Axis::new(AxisId::Horizontal, AxisConstraints::from_config(&config))
    }

    fn start_move(axis: &mut Axis, channel: &mut TestChannel, target: i32) {
        axis.begin_move(target, 4000, false);
        axis.profile = MotionProfile::plan(
            axis.current_position,
            target,
            4000,
            axis.constraints.acceleration,
            axis.constraints.min_speed,
        );
        channel.arm(axis.constraints.min_speed).unwrap();
    }

    #[test]
    fn test_move_counts_exact_steps() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        start_move(&mut axis, &mut channel, 10);

        let mut arrived = false;
        for _ in 0..40 {
            match axis.on_timer_event(&mut channel).unwrap() {
                StepEvent::Arrived => {
                    arrived = true;
                    break;
                }
                _ => {}
            }
        }

        assert!(arrived);
        assert_eq!(axis.current_position, 10);
        assert_eq!(channel.rising_edges, 10);
        assert!(!channel.is_armed());
        assert!(axis.completed);
    }

    #[test]
    fn test_position_stays_bounded_during_move() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        start_move(&mut axis, &mut channel, 25);

        loop {
            match axis.on_timer_event(&mut channel).unwrap() {
                StepEvent::Arrived => break,
                _ => {
                    assert!(axis.current_position >= 0);
                    assert!(axis.current_position <= 25);
                }
            }
        }
    }

    #[test]
    fn test_reverse_move_decrements_position() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        axis.current_position = 100;
        start_move(&mut axis, &mut channel, 90);

        loop {
            if axis.on_timer_event(&mut channel).unwrap() == StepEvent::Arrived {
                break;
            }
        }

        assert_eq!(axis.current_position, 90);
        assert_eq!(axis.relative_travelled(), -10);
    }

    #[test]
    fn test_falling_edges_do_not_count() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        start_move(&mut axis, &mut channel, 100);

        // Two timer events are one step
        assert_eq!(
            axis.on_timer_event(&mut channel).unwrap(),
            StepEvent::Stepped
        );
        assert_eq!(axis.on_timer_event(&mut channel).unwrap(), StepEvent::None);
        assert_eq!(axis.current_position, 1);
    }

    #[test]
    fn test_spurious_event_when_idle_disarms() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        channel.armed = true;

        assert_eq!(axis.on_timer_event(&mut channel).unwrap(), StepEvent::None);
        assert!(!channel.is_armed());
        assert_eq!(axis.current_position, 0);
    }

    #[test]
    fn test_abort_stops_in_place() {
        let mut axis = test_axis();
        let mut channel = TestChannel::default();
        start_move(&mut axis, &mut channel, 1000);

        for _ in 0..20 {
            axis.on_timer_event(&mut channel).unwrap();
        }
        let before = axis.current_position;

        axis.abort(&mut channel);
        assert!(!channel.is_armed());
        assert!(axis.completed);
        assert_eq!(axis.current_position, before);

        // Aborting an idle axis is a no-op
        axis.completed = false;
        axis.abort(&mut channel);
        assert!(!axis.completed);
    }
}
