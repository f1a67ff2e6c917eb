//! Two-servo arm with time-parameterized interpolation.
//!
//! The shoulder/elbow pair moves linearly in joint space from the current
//! angles to the target over `time_ms`, updated from the profile tick (well
//! above the 50 Hz servo frame). Pulse widths map the 0°–180° range onto a
//! per-servo `pulse_min_us..pulse_max_us` calibration.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::{ServoChannelConfig, ServoConfig};
use crate::error::ActuatorError;

/// Servo PWM frame period in microseconds (50 Hz).
const FRAME_US: u16 = 20_000;

/// One of the two arm servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoId {
    /// Servo 1 on the wire.
    Shoulder,
    /// Servo 2 on the wire.
    Elbow,
}

impl ServoId {
    /// Map the protocol selector (1 or 2).
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(ServoId::Shoulder),
            2 => Some(ServoId::Elbow),
            _ => None,
        }
    }

    /// Protocol selector of this servo.
    pub fn number(self) -> u8 {
        match self {
            ServoId::Shoulder => 1,
            ServoId::Elbow => 2,
        }
    }
}

/// Writes servo pulse widths to the hardware.
///
/// Implemented by [`PwmServoBank`] over embedded-hal PWM channels or
/// directly by a platform.
pub trait ServoBank {
    /// Drive one servo with a pulse of `pulse_us` microseconds per frame.
    fn set_pulse(&mut self, servo: ServoId, pulse_us: u16) -> Result<(), ActuatorError>;
}

/// Servo bank over two embedded-hal 1.0 PWM channels at 50 Hz.
pub struct PwmServoBank<P1, P2>
where
    P1: SetDutyCycle,
    P2: SetDutyCycle,
{
    shoulder: P1,
    elbow: P2,
}

impl<P1, P2> PwmServoBank<P1, P2>
where
    P1: SetDutyCycle,
    P2: SetDutyCycle,
{
    /// Wrap the two PWM channels. Both must be configured for a 20 ms frame.
    pub fn new(shoulder: P1, elbow: P2) -> Self {
        Self { shoulder, elbow }
    }
}

impl<P1, P2> ServoBank for PwmServoBank<P1, P2>
where
    P1: SetDutyCycle,
    P2: SetDutyCycle,
{
    fn set_pulse(&mut self, servo: ServoId, pulse_us: u16) -> Result<(), ActuatorError> {
        let pulse = pulse_us.min(FRAME_US);
        match servo {
            ServoId::Shoulder => self
                .shoulder
                .set_duty_cycle_fraction(pulse, FRAME_US)
                .map_err(|_| ActuatorError::PinError),
            ServoId::Elbow => self
                .elbow
                .set_duty_cycle_fraction(pulse, FRAME_US)
                .map_err(|_| ActuatorError::PinError),
        }
    }
}

/// Interpolation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServoMotion {
    Idle,
    Moving,
}

/// What one servo update produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoUpdate {
    /// No move in flight.
    Idle,
    /// Interpolation still running.
    Moving,
    /// Both servos reached their targets this update.
    Completed,
}

/// The shoulder/elbow pair: clamping, interpolation and position tracking.
///
/// Pure state; the hardware is reached through a [`ServoBank`] passed at
/// each call so the pair stays testable without pins.
pub struct ServoPair {
    shoulder_cal: ServoChannelConfig,
    elbow_cal: ServoChannelConfig,
    neutral_angle: u8,
    max_move_time_ms: u16,
    current1: u8,
    current2: u8,
    start1: u8,
    start2: u8,
    target1: u8,
    target2: u8,
    start_ms: u32,
    duration_ms: u32,
    motion: ServoMotion,
}

impl ServoPair {
    /// Create the pair at the neutral angle (not yet driven).
    pub fn new(config: &ServoConfig) -> Self {
        Self {
            shoulder_cal: config.shoulder.clone(),
            elbow_cal: config.elbow.clone(),
            neutral_angle: config.neutral_angle,
            max_move_time_ms: config.max_move_time_ms,
            current1: config.neutral_angle,
            current2: config.neutral_angle,
            start1: config.neutral_angle,
            start2: config.neutral_angle,
            target1: config.neutral_angle,
            target2: config.neutral_angle,
            start_ms: 0,
            duration_ms: 0,
            motion: ServoMotion::Idle,
        }
    }

    fn calibration(&self, servo: ServoId) -> &ServoChannelConfig {
        match servo {
            ServoId::Shoulder => &self.shoulder_cal,
            ServoId::Elbow => &self.elbow_cal,
        }
    }

    fn clamp_angle(&self, servo: ServoId, angle: u8) -> u8 {
        let cal = self.calibration(servo);
        angle.clamp(cal.min_angle, cal.max_angle)
    }

    fn pulse_for(&self, servo: ServoId, angle: u8) -> u16 {
        let cal = self.calibration(servo);
        let span = (cal.pulse_max_us - cal.pulse_min_us) as u32;
        cal.pulse_min_us + (span * angle as u32 / 180) as u16
    }

    fn drive<B: ServoBank>(
        &mut self,
        bank: &mut B,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), ActuatorError> {
        let pulse = self.pulse_for(servo, angle);
        bank.set_pulse(servo, pulse)?;
        match servo {
            ServoId::Shoulder => self.current1 = angle,
            ServoId::Elbow => self.current2 = angle,
        }
        Ok(())
    }

    /// Drive both servos to restored boot angles without interpolation.
    pub fn restore<B: ServoBank>(
        &mut self,
        bank: &mut B,
        angle1: u8,
        angle2: u8,
    ) -> Result<(), ActuatorError> {
        let a1 = self.clamp_angle(ServoId::Shoulder, angle1);
        let a2 = self.clamp_angle(ServoId::Elbow, angle2);
        self.drive(bank, ServoId::Shoulder, a1)?;
        self.drive(bank, ServoId::Elbow, a2)?;
        self.motion = ServoMotion::Idle;
        Ok(())
    }

    /// Set one servo immediately. Returns the clamped angle actually used.
    pub fn set_position<B: ServoBank>(
        &mut self,
        bank: &mut B,
        servo: ServoId,
        angle: u8,
    ) -> Result<u8, ActuatorError> {
        let clamped = self.clamp_angle(servo, angle);
        self.drive(bank, servo, clamped)?;
        self.motion = ServoMotion::Idle;
        Ok(clamped)
    }

    /// Reset both servos to the neutral angle immediately.
    pub fn reset<B: ServoBank>(&mut self, bank: &mut B) -> Result<(), ActuatorError> {
        let neutral = self.neutral_angle;
        self.set_position(bank, ServoId::Shoulder, neutral)?;
        self.set_position(bank, ServoId::Elbow, neutral)?;
        Ok(())
    }

    /// Start an interpolated move of both servos over `time_ms`
    /// (instantaneous when zero). Returns the clamped targets and time.
    pub fn move_to<B: ServoBank>(
        &mut self,
        bank: &mut B,
        angle1: u8,
        angle2: u8,
        time_ms: u16,
        now_ms: u32,
    ) -> Result<(u8, u8, u16), ActuatorError> {
        let a1 = self.clamp_angle(ServoId::Shoulder, angle1);
        let a2 = self.clamp_angle(ServoId::Elbow, angle2);
        let time_ms = time_ms.min(self.max_move_time_ms);

        if time_ms == 0 {
            self.drive(bank, ServoId::Shoulder, a1)?;
            self.drive(bank, ServoId::Elbow, a2)?;
            self.motion = ServoMotion::Idle;
        } else {
            self.start1 = self.current1;
            self.start2 = self.current2;
            self.target1 = a1;
            self.target2 = a2;
            self.start_ms = now_ms;
            self.duration_ms = time_ms as u32;
            self.motion = ServoMotion::Moving;
        }

        Ok((a1, a2, time_ms))
    }

    /// Advance the interpolation. Called from the profile tick.
    pub fn update<B: ServoBank>(
        &mut self,
        bank: &mut B,
        now_ms: u32,
    ) -> Result<ServoUpdate, ActuatorError> {
        if self.motion != ServoMotion::Moving {
            return Ok(ServoUpdate::Idle);
        }

        let elapsed = now_ms.wrapping_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            let (t1, t2) = (self.target1, self.target2);
            self.drive(bank, ServoId::Shoulder, t1)?;
            self.drive(bank, ServoId::Elbow, t2)?;
            self.motion = ServoMotion::Idle;
            return Ok(ServoUpdate::Completed);
        }

        let lerp = |start: u8, target: u8| -> u8 {
            let delta = target as i32 - start as i32;
            (start as i32 + delta * elapsed as i32 / self.duration_ms as i32) as u8
        };

        let new1 = lerp(self.start1, self.target1);
        let new2 = lerp(self.start2, self.target2);

        if new1 != self.current1 {
            self.drive(bank, ServoId::Shoulder, new1)?;
        }
        if new2 != self.current2 {
            self.drive(bank, ServoId::Elbow, new2)?;
        }

        Ok(ServoUpdate::Moving)
    }

    /// Current angles (shoulder, elbow).
    pub fn positions(&self) -> (u8, u8) {
        (self.current1, self.current2)
    }

    /// Whether an interpolated move is running.
    pub fn is_busy(&self) -> bool {
        self.motion == ServoMotion::Moving
    }
}
