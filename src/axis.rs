//! Per-axis state.
//!
//! One [`Axis`] exists per controlled linear degree of freedom. Its position
//! counter is owned by the pulse engine running in the timer ISR; everything
//! else reads snapshots taken while that interrupt is masked (the facade's
//! entry points document the exclusion contract).

use crate::config::AxisConstraints;
use crate::motion::MotionProfile;

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward the maximum-travel switch (positive step count).
    Forward,
    /// Toward the origin switch (negative step count).
    Reverse,
}

impl Direction {
    /// Get direction from a signed step delta.
    #[inline]
    pub fn from_delta(delta: i32) -> Self {
        if delta >= 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Lifecycle state of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisState {
    /// Idle and ready for a move.
    #[default]
    Idle,
    /// Executing a coordinated move.
    Moving,
    /// Moving in calibration mode, counting pulses toward a switch.
    Homing,
    /// Stopped by a fault; requires host attention.
    Error,
}

/// Identifies one of the two planned axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisId {
    /// Horizontal gantry axis (two slaved motors).
    Horizontal,
    /// Vertical leadscrew axis.
    Vertical,
}

/// Interrupt-consistent snapshot of an axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisSnapshot {
    /// Position in steps at snapshot time.
    pub position: i32,
    /// Target of the current (or last) move.
    pub target: i32,
    /// Steps travelled since the move began (signed).
    pub relative: i32,
    /// Lifecycle state.
    pub state: AxisState,
    /// Live commanded cadence in steps/s.
    pub speed: u32,
}

/// Runtime state of one linear axis.
///
/// The struct itself is plain data; the pulse engine
/// ([`crate::motion::pulse`]) mutates it from ISR context and the
/// coordinator drives it from the main loop.
#[derive(Debug)]
pub struct Axis {
    /// Which axis this is (selects event wording on the wire).
    pub id: AxisId,

    /// Derived mechanical constants.
    pub constraints: AxisConstraints,

    /// Live position in steps. Written only by the pulse engine while a
    /// move is running.
    pub current_position: i32,

    /// Target of the current move, set before arming.
    pub target_position: i32,

    /// Position at which the current move started (relative reporting).
    pub move_origin: i32,

    /// Latched direction; never changed while the timer runs.
    pub direction: Direction,

    /// Lifecycle state.
    pub state: AxisState,

    /// Live commanded cadence in steps/s.
    pub current_speed: u32,

    /// Peak cadence planned for this move.
    pub peak_speed: u32,

    /// Runtime speed ceiling (host `V` command), clamped to the hard max.
    pub max_speed: u32,

    /// Driver-enable mirror.
    pub enabled: bool,

    /// Raised by the pulse engine on arrival, consumed in the main loop.
    pub completed: bool,

    /// Kinematic plan for the current move.
    pub profile: MotionProfile,
}

impl Axis {
    /// Create an idle axis from its constraints.
    pub fn new(id: AxisId, constraints: AxisConstraints) -> Self {
        let max_speed = constraints.max_speed;
        Self {
            id,
            constraints,
            current_position: 0,
            target_position: 0,
            move_origin: 0,
            direction: Direction::Forward,
            state: AxisState::Idle,
            current_speed: 0,
            peak_speed: 0,
            max_speed,
            enabled: false,
            completed: false,
            profile: MotionProfile::idle(),
        }
    }

    /// Whether a move is currently executing.
    #[inline]
    pub fn is_moving(&self) -> bool {
        matches!(self.state, AxisState::Moving | AxisState::Homing)
    }

    /// Steps travelled since the current move began (signed).
    #[inline]
    pub fn relative_travelled(&self) -> i32 {
        self.current_position - self.move_origin
    }

    /// Remaining distance to the target in steps.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        (self.target_position - self.current_position).unsigned_abs()
    }

    /// Take a coherent snapshot for reporting.
    pub fn snapshot(&self) -> AxisSnapshot {
        AxisSnapshot {
            position: self.current_position,
            target: self.target_position,
            relative: self.relative_travelled(),
            state: self.state,
            speed: self.current_speed,
        }
    }

    /// Seed a new move: latch target, origin and direction. The engine is
    /// armed separately by the coordinator.
    pub fn begin_move(&mut self, target: i32, peak_speed: u32, homing: bool) {
        self.target_position = target;
        self.move_origin = self.current_position;
        self.direction = Direction::from_delta(target - self.current_position);
        self.peak_speed = peak_speed;
        self.current_speed = 0;
        self.completed = false;
        self.state = if homing {
            AxisState::Homing
        } else {
            AxisState::Moving
        };
    }

    /// Mark the axis arrived or aborted: idle state, profile reset,
    /// completion flag raised for the main loop.
    pub fn finish_move(&mut self) {
        self.state = AxisState::Idle;
        self.current_speed = 0;
        self.profile.reset();
        self.completed = true;
    }

    /// Reseat the position counter (homing / host resync). Only valid
    /// between moves.
    pub fn set_position(&mut self, position: i32) {
        debug_assert!(!self.is_moving());
        self.current_position = position;
        self.move_origin = position;
        self.target_position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{Microsteps, StepsPerSec, StepsPerSecSq};
    use crate::config::AxisConfig;

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

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(100), Direction::Forward);
        assert_eq!(Direction::from_delta(-1), Direction::Reverse);
        assert_eq!(Direction::from_delta(0), Direction::Forward);
    }

    #[test]
    fn test_begin_move_latches_state() {
        let mut axis = test_axis();
        axis.current_position = 200;

        axis.begin_move(1000, 4000, false);
        assert_eq!(axis.target_position, 1000);
        assert_eq!(axis.move_origin, 200);
        assert_eq!(axis.direction, Direction::Forward);
        assert_eq!(axis.state, AxisState::Moving);
        assert!(!axis.completed);

        axis.begin_move(-50, 4000, true);
        assert_eq!(axis.direction, Direction::Reverse);
        assert_eq!(axis.state, AxisState::Homing);
    }

    #[test]
    fn test_relative_travelled() {
        let mut axis = test_axis();
        axis.current_position = 500;
        axis.begin_move(1500, 4000, false);
        axis.current_position = 1234;
        assert_eq!(axis.relative_travelled(), 734);
    }

    #[test]
    fn test_finish_move_raises_completed() {
        let mut axis = test_axis();
        axis.begin_move(100, 4000, false);
        axis.finish_move();
        assert_eq!(axis.state, AxisState::Idle);
        assert!(axis.completed);
        assert_eq!(axis.current_speed, 0);
    }
}
