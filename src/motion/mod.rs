//! Motion module for gantry-motion.
//!
//! Provides the per-axis velocity profiler, the ISR-side pulse engine and
//! the two-axis velocity coupling.

mod coordinator;
mod profile;
pub mod pulse;

pub use coordinator::{plan_coordinated, AxisPlan};
pub use profile::{MotionProfile, ProfilePhase};
pub use pulse::StepEvent;
