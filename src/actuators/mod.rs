//! Auxiliary actuators: the two-servo arm and the unipolar gripper.

mod gripper;
mod servo;

pub use gripper::{
    CoilDrive, Gripper, GripperCoils, GripperState, GripperUpdate, HALF_STEP_PATTERNS,
};
pub use servo::{PwmServoBank, ServoBank, ServoId, ServoPair, ServoUpdate};
