//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::actuators::{GripperConfig, ServoChannelConfig, ServoConfig};
use super::axis::AxisConfig;
use super::MachineConfig;

/// Validate a machine configuration.
///
/// Checks:
/// - Axis mechanical parameters are physically meaningful
/// - Speed range is non-empty (min < max)
/// - Tick rate is within the 100-500 Hz contract
/// - Servo pulse calibrations and angle clamps are ordered
/// - Gripper travel is non-zero
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    validate_axis(&config.horizontal)?;
    validate_axis(&config.vertical)?;

    if !(100..=500).contains(&config.tick.rate_hz) {
        return Err(Error::Config(ConfigError::InvalidTickRate(
            config.tick.rate_hz,
        )));
    }

    validate_servos(&config.servos)?;
    validate_gripper(&config.gripper)?;

    Ok(())
}

fn validate_axis(config: &AxisConfig) -> Result<()> {
    if config.mm_per_rev <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidMmPerRev(
            config.mm_per_rev,
        )));
    }

    if config.max_speed.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxSpeed(
            config.max_speed.value(),
        )));
    }

    if config.min_speed.value() == 0 || config.min_speed >= config.max_speed {
        return Err(Error::Config(ConfigError::InvalidMinSpeed(
            config.min_speed.value(),
        )));
    }

    if config.acceleration.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            config.acceleration.value(),
        )));
    }

    if config.travel_mm <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidTravel(config.travel_mm)));
    }

    Ok(())
}

fn validate_servos(config: &ServoConfig) -> Result<()> {
    validate_servo_channel(&config.shoulder)?;
    validate_servo_channel(&config.elbow)?;
    Ok(())
}

fn validate_servo_channel(channel: &ServoChannelConfig) -> Result<()> {
    // Pulses must fit inside a 50 Hz servo frame with ordering intact
    if channel.pulse_min_us >= channel.pulse_max_us || channel.pulse_max_us > 20_000 {
        return Err(Error::Config(ConfigError::InvalidServoPulse {
            min_us: channel.pulse_min_us,
            max_us: channel.pulse_max_us,
        }));
    }

    if channel.min_angle >= channel.max_angle || channel.max_angle > 180 {
        return Err(Error::Config(ConfigError::InvalidServoRange {
            min: channel.min_angle,
            max: channel.max_angle,
        }));
    }

    Ok(())
}

fn validate_gripper(config: &GripperConfig) -> Result<()> {
    if config.steps_to_close == 0 {
        return Err(Error::Config(ConfigError::InvalidGripperTravel(
            config.steps_to_close,
        )));
    }

    Ok(())
}
