//! Error types for gantry-motion.
//!
//! Provides unified error handling across configuration, motion control, the
//! command protocol and the auxiliary actuators.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all gantry-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motion planning or execution error
    Motion(MotionError),
    /// Command frame or grammar error
    Command(CommandError),
    /// Servo or gripper error
    Actuator(ActuatorError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep divisor (must be a power of 2 the driver's DIP
    /// switches can select, 1 through 32)
    InvalidMicrosteps(u16),
    /// Invalid mm-per-revolution (must be > 0)
    InvalidMmPerRev(f32),
    /// Invalid maximum speed (must be > 0 steps/s)
    InvalidMaxSpeed(u32),
    /// Invalid minimum speed (must be > 0 and < max speed)
    InvalidMinSpeed(u32),
    /// Invalid acceleration (must be > 0 steps/s²)
    InvalidAcceleration(u32),
    /// Invalid workspace travel (must be > 0 mm)
    InvalidTravel(f32),
    /// Invalid profile tick rate (must be 100–500 Hz)
    InvalidTickRate(u16),
    /// Invalid servo pulse calibration (min must be < max, both within the frame)
    InvalidServoPulse {
        /// Minimum pulse width in microseconds
        min_us: u16,
        /// Maximum pulse width in microseconds
        max_us: u16,
    },
    /// Invalid servo angle range (min must be < max, max ≤ 180)
    InvalidServoRange {
        /// Minimum allowed angle
        min: u8,
        /// Maximum allowed angle
        max: u8,
    },
    /// Invalid gripper travel (steps to close must be > 0)
    InvalidGripperTravel(u16),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motion planning and execution errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Pin or timer channel operation failed
    PinError,
    /// Target lies outside the workspace
    OutOfBounds {
        /// Requested target position in steps
        target: i32,
        /// Workspace limit that was exceeded (steps)
        limit: i32,
    },
    /// Axis drivers are disabled
    Disabled,
    /// A coordinated move is already being processed
    Busy,
}

/// Command frame and grammar errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Frame payload was empty
    Empty,
    /// Verb is not part of the command surface
    UnknownVerb,
    /// Argument list malformed or out of range
    InvalidParams,
    /// Servo selector outside 1..=2
    InvalidServoNumber(u8),
}

/// Servo and gripper errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorError {
    /// PWM or coil pin operation failed
    PinError,
    /// Servo selector outside 1..=2
    InvalidServo(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Command(e) => write!(f, "Command error: {}", e),
            Error::Actuator(e) => write!(f, "Actuator error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microstep divisor: {}. The drivers take powers of 2 up to 32", v)
            }
            ConfigError::InvalidMmPerRev(v) => write!(f, "Invalid mm per revolution: {}. Must be > 0", v),
            ConfigError::InvalidMaxSpeed(v) => write!(f, "Invalid max speed: {} steps/s. Must be > 0", v),
            ConfigError::InvalidMinSpeed(v) => {
                write!(f, "Invalid min speed: {} steps/s. Must be > 0 and below max speed", v)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {} steps/s2. Must be > 0", v)
            }
            ConfigError::InvalidTravel(v) => write!(f, "Invalid travel: {} mm. Must be > 0", v),
            ConfigError::InvalidTickRate(v) => {
                write!(f, "Invalid tick rate: {} Hz. Must be 100-500", v)
            }
            ConfigError::InvalidServoPulse { min_us, max_us } => {
                write!(f, "Invalid servo pulse range: {}-{} us", min_us, max_us)
            }
            ConfigError::InvalidServoRange { min, max } => {
                write!(f, "Invalid servo angle range: {}-{} degrees", min, max)
            }
            ConfigError::InvalidGripperTravel(v) => {
                write!(f, "Invalid gripper travel: {} steps. Must be > 0", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::PinError => write!(f, "GPIO or timer channel operation failed"),
            MotionError::OutOfBounds { target, limit } => {
                write!(f, "Target {} exceeds workspace limit {}", target, limit)
            }
            MotionError::Disabled => write!(f, "Axis drivers are disabled"),
            MotionError::Busy => write!(f, "Coordinated move already in progress"),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "Empty command frame"),
            CommandError::UnknownVerb => write!(f, "Unknown command verb"),
            CommandError::InvalidParams => write!(f, "Malformed command arguments"),
            CommandError::InvalidServoNumber(n) => write!(f, "Invalid servo number: {}", n),
        }
    }
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorError::PinError => write!(f, "PWM or coil pin operation failed"),
            ActuatorError::InvalidServo(n) => write!(f, "Invalid servo number: {}", n),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Error::Actuator(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

#[cfg(feature = "std")]
impl std::error::Error for ActuatorError {}
