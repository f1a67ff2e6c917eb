//! Unipolar gripper stepper.
//!
//! Half-step 8-phase sequence on four coil outputs. Motion is
//! step-budgeted: a countdown decremented from the profile tick advances
//! or retreats the phase index once per `ticks_per_step` expiry. End of
//! travel drops all coils so the little motor does not cook.

use embedded_hal::digital::OutputPin;

use crate::config::GripperConfig;
use crate::error::ActuatorError;

/// The 8 half-step coil patterns, bit 0 = IN1 .. bit 3 = IN4.
pub const HALF_STEP_PATTERNS: [u8; 8] = [
    0b0001, 0b0011, 0b0010, 0b0110, 0b0100, 0b1100, 0b1000, 0b1001,
];

/// Drives the four gripper coils.
pub trait CoilDrive {
    /// Apply a coil pattern; zero drops all coils.
    fn apply(&mut self, pattern: u8) -> Result<(), ActuatorError>;
}

/// Coil drive over four embedded-hal output pins.
pub struct GripperCoils<A, B, C, D>
where
    A: OutputPin,
    B: OutputPin,
    C: OutputPin,
    D: OutputPin,
{
    in1: A,
    in2: B,
    in3: C,
    in4: D,
}

impl<A, B, C, D> GripperCoils<A, B, C, D>
where
    A: OutputPin,
    B: OutputPin,
    C: OutputPin,
    D: OutputPin,
{
    /// Wrap the four coil pins.
    pub fn new(in1: A, in2: B, in3: C, in4: D) -> Self {
        Self { in1, in2, in3, in4 }
    }
}

impl<A, B, C, D> CoilDrive for GripperCoils<A, B, C, D>
where
    A: OutputPin,
    B: OutputPin,
    C: OutputPin,
    D: OutputPin,
{
    fn apply(&mut self, pattern: u8) -> Result<(), ActuatorError> {
        let bit = |n: u8| pattern & (1 << n) != 0;
        self.in1
            .set_state(bit(0).into())
            .map_err(|_| ActuatorError::PinError)?;
        self.in2
            .set_state(bit(1).into())
            .map_err(|_| ActuatorError::PinError)?;
        self.in3
            .set_state(bit(2).into())
            .map_err(|_| ActuatorError::PinError)?;
        self.in4
            .set_state(bit(3).into())
            .map_err(|_| ActuatorError::PinError)?;
        Ok(())
    }
}

/// Gripper jaw state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GripperState {
    /// Fully open, coils released.
    Open,
    /// Travelling toward open.
    Opening,
    /// Fully closed, coils released.
    Closed,
    /// Travelling toward closed.
    Closing,
}

impl GripperState {
    /// Wire spelling for `G?` and events.
    pub fn wire_name(self) -> &'static str {
        match self {
            GripperState::Open => "OPEN",
            GripperState::Opening => "OPENING",
            GripperState::Closed => "CLOSED",
            GripperState::Closing => "CLOSING",
        }
    }
}

/// What one gripper update produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GripperUpdate {
    /// Nothing to do.
    Idle,
    /// Budget still counting down.
    Stepping,
    /// Travel finished; coils dropped.
    Completed(GripperState),
}

/// Step-budgeted half-step gripper engine.
pub struct Gripper {
    phase: u8,
    position_steps: u16,
    steps_to_do: u16,
    direction: i8,
    state: GripperState,
    target_state: GripperState,
    tick_counter: u16,
    ticks_per_step: u16,
    steps_to_close: u16,
}

impl Gripper {
    /// Create an open gripper at position zero.
    pub fn new(config: &GripperConfig) -> Self {
        Self {
            phase: 0,
            position_steps: 0,
            steps_to_do: 0,
            direction: 0,
            state: GripperState::Open,
            target_state: GripperState::Open,
            tick_counter: 0,
            ticks_per_step: config.ticks_per_step.max(1),
            steps_to_close: config.steps_to_close,
        }
    }

    /// Restore the persisted position and resting state.
    pub fn restore(&mut self, position_steps: u16, closed: bool) {
        self.position_steps = position_steps.min(self.steps_to_close);
        self.phase = (self.position_steps % 8) as u8;
        self.state = if closed {
            GripperState::Closed
        } else {
            GripperState::Open
        };
        self.target_state = self.state;
    }

    /// Begin opening. Returns `false` when already open or opening.
    pub fn open(&mut self) -> bool {
        if matches!(self.state, GripperState::Open | GripperState::Opening) {
            return false;
        }
        self.steps_to_do = self.position_steps;
        self.direction = -1;
        self.state = GripperState::Opening;
        self.target_state = GripperState::Open;
        self.tick_counter = 0;
        true
    }

    /// Begin closing. Returns `false` when already closed or closing.
    pub fn close(&mut self) -> bool {
        if matches!(self.state, GripperState::Closed | GripperState::Closing) {
            return false;
        }
        self.steps_to_do = self.steps_to_close - self.position_steps.min(self.steps_to_close);
        self.direction = 1;
        self.state = GripperState::Closing;
        self.target_state = GripperState::Closed;
        self.tick_counter = 0;
        true
    }

    /// Toggle: closed/closing opens, open/opening closes. Returns the
    /// travel direction chosen.
    pub fn toggle(&mut self) -> GripperState {
        match self.state {
            GripperState::Closed | GripperState::Closing => {
                self.open();
                GripperState::Opening
            }
            GripperState::Open | GripperState::Opening => {
                self.close();
                GripperState::Closing
            }
        }
    }

    /// Advance the step budget by one profile tick.
    pub fn update<C: CoilDrive>(&mut self, coils: &mut C) -> Result<GripperUpdate, ActuatorError> {
        if self.steps_to_do == 0 || self.direction == 0 {
            if matches!(self.state, GripperState::Opening | GripperState::Closing) {
                coils.apply(0)?;
                self.state = self.target_state;
                self.direction = 0;
                return Ok(GripperUpdate::Completed(self.state));
            }
            return Ok(GripperUpdate::Idle);
        }

        self.tick_counter += 1;
        if self.tick_counter < self.ticks_per_step {
            // Hold the current pattern between steps
            coils.apply(HALF_STEP_PATTERNS[self.phase as usize])?;
            return Ok(GripperUpdate::Stepping);
        }
        self.tick_counter = 0;

        if self.direction > 0 {
            self.phase = (self.phase + 1) % 8;
            self.position_steps = self.position_steps.saturating_add(1);
        } else {
            self.phase = if self.phase == 0 { 7 } else { self.phase - 1 };
            self.position_steps = self.position_steps.saturating_sub(1);
        }

        coils.apply(HALF_STEP_PATTERNS[self.phase as usize])?;

        self.steps_to_do -= 1;
        if self.steps_to_do == 0 {
            coils.apply(0)?;
            self.direction = 0;
            self.state = self.target_state;
            return Ok(GripperUpdate::Completed(self.state));
        }

        Ok(GripperUpdate::Stepping)
    }

    /// Stop mid-travel: coils off, resting state from the position.
    pub fn stop<C: CoilDrive>(&mut self, coils: &mut C) -> Result<(), ActuatorError> {
        coils.apply(0)?;
        self.steps_to_do = 0;
        self.direction = 0;
        self.state = if self.position_steps < self.steps_to_close / 2 {
            GripperState::Open
        } else {
            GripperState::Closed
        };
        self.target_state = self.state;
        Ok(())
    }

    /// Current jaw state.
    pub fn state(&self) -> GripperState {
        self.state
    }

    /// Position in half-steps from fully open.
    pub fn position(&self) -> u16 {
        self.position_steps
    }

    /// Whether a travel budget is pending.
    pub fn is_busy(&self) -> bool {
        self.steps_to_do > 0
    }
}
