//! Command grammar.
//!
//! A frame payload is a verb, optionally followed by `:` and comma-separated
//! arguments. Parsing is pure; dispatch lives in the machine facade.

use crate::error::CommandError;

/// A parsed host command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `M:x,y` — relative coordinated move in millimetres.
    Move {
        /// Horizontal displacement in mm (signed).
        x_mm: f32,
        /// Vertical displacement in mm (signed).
        y_mm: f32,
    },
    /// `S` — stop all axes in place.
    Stop,
    /// `A:a1,a2,t` — interpolated dual-servo move over `time_ms`.
    ArmMove {
        /// Shoulder target angle in degrees.
        angle1: u8,
        /// Elbow target angle in degrees.
        angle2: u8,
        /// Interpolation time; zero means instantaneous.
        time_ms: u16,
    },
    /// `P:n,angle` — set a single servo immediately.
    ServoSet {
        /// Servo selector (1 or 2).
        servo: u8,
        /// Target angle in degrees.
        angle: u8,
    },
    /// `RA` — both servos to the neutral angle.
    ArmsReset,
    /// `G:O` — open the gripper.
    GripperOpen,
    /// `G:C` — close the gripper.
    GripperClose,
    /// `GT` — toggle the gripper.
    GripperToggle,
    /// `G?` — report gripper state and step position.
    GripperQuery,
    /// `V:h,v` — override per-axis speed ceilings (clamped to hard max).
    SetSpeeds {
        /// Horizontal ceiling in steps/s.
        h: u32,
        /// Vertical ceiling in steps/s.
        v: u32,
    },
    /// `L` — report the limit-switch mask.
    LimitQuery,
    /// `Q` — report current servo angles.
    ServoQuery,
    /// `CS` — start calibration mode (count pulses until a limit).
    CalibrationStart,
    /// `CE` — stop calibration mode.
    CalibrationEnd,
    /// `HB:0|1` — disable/enable the limit heartbeat.
    Heartbeat {
        /// Heartbeat enabled.
        on: bool,
    },
    /// `XY?` — report the position in millimetres.
    PositionQuery,
    /// `S?` — report machine state and step positions.
    StatusQuery,
}

/// Parse a frame payload into a command.
pub fn parse(payload: &str) -> Result<Command, CommandError> {
    if payload.is_empty() {
        return Err(CommandError::Empty);
    }

    // Argument-less verbs first; they are exact matches
    match payload {
        "S" => return Ok(Command::Stop),
        "RA" => return Ok(Command::ArmsReset),
        "GT" => return Ok(Command::GripperToggle),
        "G?" => return Ok(Command::GripperQuery),
        "L" => return Ok(Command::LimitQuery),
        "Q" => return Ok(Command::ServoQuery),
        "CS" => return Ok(Command::CalibrationStart),
        "CE" => return Ok(Command::CalibrationEnd),
        "XY?" => return Ok(Command::PositionQuery),
        "S?" => return Ok(Command::StatusQuery),
        _ => {}
    }

    let (verb, args) = match payload.split_once(':') {
        Some((verb, args)) => (verb, args),
        None => return Err(CommandError::UnknownVerb),
    };

    match verb {
        "M" => {
            let (x_mm, y_mm) = parse_two_f32(args)?;
            Ok(Command::Move { x_mm, y_mm })
        }
        "A" => {
            let [a1, a2, t] = parse_ints::<3>(args)?;
            let angle1 = check_angle(a1)?;
            let angle2 = check_angle(a2)?;
            if !(0..=u16::MAX as i32).contains(&t) {
                return Err(CommandError::InvalidParams);
            }
            Ok(Command::ArmMove {
                angle1,
                angle2,
                time_ms: t as u16,
            })
        }
        "P" => {
            let [servo, angle] = parse_ints::<2>(args)?;
            if !(0..=255).contains(&servo) {
                return Err(CommandError::InvalidParams);
            }
            Ok(Command::ServoSet {
                servo: servo as u8,
                angle: check_angle(angle)?,
            })
        }
        "G" => match args {
            "O" => Ok(Command::GripperOpen),
            "C" => Ok(Command::GripperClose),
            _ => Err(CommandError::InvalidParams),
        },
        "V" => {
            let [h, v] = parse_ints::<2>(args)?;
            if h <= 0 || v <= 0 {
                return Err(CommandError::InvalidParams);
            }
            Ok(Command::SetSpeeds {
                h: h as u32,
                v: v as u32,
            })
        }
        "HB" => match args {
            "0" => Ok(Command::Heartbeat { on: false }),
            "1" => Ok(Command::Heartbeat { on: true }),
            _ => Err(CommandError::InvalidParams),
        },
        _ => Err(CommandError::UnknownVerb),
    }
}

fn check_angle(value: i32) -> Result<u8, CommandError> {
    if (0..=180).contains(&value) {
        Ok(value as u8)
    } else {
        Err(CommandError::InvalidParams)
    }
}

fn parse_two_f32(args: &str) -> Result<(f32, f32), CommandError> {
    let (a, b) = args.split_once(',').ok_or(CommandError::InvalidParams)?;
    let x = a
        .trim()
        .parse::<f32>()
        .map_err(|_| CommandError::InvalidParams)?;
    let y = b
        .trim()
        .parse::<f32>()
        .map_err(|_| CommandError::InvalidParams)?;
    if !x.is_finite() || !y.is_finite() {
        return Err(CommandError::InvalidParams);
    }
    Ok((x, y))
}

fn parse_ints<const N: usize>(args: &str) -> Result<[i32; N], CommandError> {
    let mut values = [0i32; N];
    let mut parts = args.split(',');

    for value in values.iter_mut() {
        let part = parts.next().ok_or(CommandError::InvalidParams)?;
        *value = part
            .trim()
            .parse::<i32>()
            .map_err(|_| CommandError::InvalidParams)?;
    }

    if parts.next().is_some() {
        return Err(CommandError::InvalidParams);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_command() {
        assert_eq!(
            parse("M:100.5,-50.2"),
            Ok(Command::Move {
                x_mm: 100.5,
                y_mm: -50.2
            })
        );
        assert_eq!(parse("M:100,0"), Ok(Command::Move { x_mm: 100.0, y_mm: 0.0 }));
    }

    #[test]
    fn test_move_rejects_malformed_args() {
        assert_eq!(parse("M:100"), Err(CommandError::InvalidParams));
        assert_eq!(parse("M:a,b"), Err(CommandError::InvalidParams));
        assert_eq!(parse("M:"), Err(CommandError::InvalidParams));
        assert_eq!(parse("M:nan,0"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_bare_verbs() {
        assert_eq!(parse("S"), Ok(Command::Stop));
        assert_eq!(parse("RA"), Ok(Command::ArmsReset));
        assert_eq!(parse("GT"), Ok(Command::GripperToggle));
        assert_eq!(parse("G?"), Ok(Command::GripperQuery));
        assert_eq!(parse("L"), Ok(Command::LimitQuery));
        assert_eq!(parse("Q"), Ok(Command::ServoQuery));
        assert_eq!(parse("CS"), Ok(Command::CalibrationStart));
        assert_eq!(parse("CE"), Ok(Command::CalibrationEnd));
        assert_eq!(parse("XY?"), Ok(Command::PositionQuery));
        assert_eq!(parse("S?"), Ok(Command::StatusQuery));
    }

    #[test]
    fn test_arm_move() {
        assert_eq!(
            parse("A:45,90,2000"),
            Ok(Command::ArmMove {
                angle1: 45,
                angle2: 90,
                time_ms: 2000
            })
        );
        assert_eq!(
            parse("A:45,90,0"),
            Ok(Command::ArmMove {
                angle1: 45,
                angle2: 90,
                time_ms: 0
            })
        );
        assert_eq!(parse("A:45,90"), Err(CommandError::InvalidParams));
        assert_eq!(parse("A:200,90,0"), Err(CommandError::InvalidParams));
        assert_eq!(parse("A:-1,90,0"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_servo_set() {
        assert_eq!(
            parse("P:1,45"),
            Ok(Command::ServoSet { servo: 1, angle: 45 })
        );
        // Selector range is checked at dispatch, not in the grammar
        assert_eq!(
            parse("P:7,45"),
            Ok(Command::ServoSet { servo: 7, angle: 45 })
        );
        assert_eq!(parse("P:1,181"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_gripper_variants() {
        assert_eq!(parse("G:O"), Ok(Command::GripperOpen));
        assert_eq!(parse("G:C"), Ok(Command::GripperClose));
        assert_eq!(parse("G:X"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_speed_override() {
        assert_eq!(parse("V:4000,6000"), Ok(Command::SetSpeeds { h: 4000, v: 6000 }));
        assert_eq!(parse("V:0,6000"), Err(CommandError::InvalidParams));
        assert_eq!(parse("V:-5,6000"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_heartbeat() {
        assert_eq!(parse("HB:1"), Ok(Command::Heartbeat { on: true }));
        assert_eq!(parse("HB:0"), Ok(Command::Heartbeat { on: false }));
        assert_eq!(parse("HB:2"), Err(CommandError::InvalidParams));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(parse(""), Err(CommandError::Empty));
        assert_eq!(parse("Z"), Err(CommandError::UnknownVerb));
        assert_eq!(parse("Z:1,2"), Err(CommandError::UnknownVerb));
        assert_eq!(parse("MOVE"), Err(CommandError::UnknownVerb));
    }

    #[test]
    fn test_extra_args_rejected() {
        assert_eq!(parse("V:1,2,3"), Err(CommandError::InvalidParams));
        assert_eq!(parse("P:1,45,9"), Err(CommandError::InvalidParams));
    }
}
