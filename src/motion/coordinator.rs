//! Coordinated two-axis velocity coupling.
//!
//! A coordinated move must land both axes on their targets in the same
//! tick. The longer axis runs at its ceiling; the shorter axis's peak is
//! scaled by the distance ratio so both profiles finish together. Scaling
//! happens in step-space: with asymmetric steps-per-mm the trajectory is a
//! straight line in steps, not millimetres.

use crate::config::AxisConstraints;

/// Peak cadence assigned to one axis of a coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPlan {
    /// Unsigned step distance of this axis.
    pub distance: u32,
    /// Peak cadence for the profile, zero when the axis does not move.
    pub peak_speed: u32,
}

/// Couple the peak velocities of a two-axis move.
///
/// `h_ceiling` / `v_ceiling` are the runtime speed ceilings (hard max
/// possibly lowered by the host). The scaled cadence of the short axis is
/// floored at its minimum speed so the profiler still arms; if the scaled
/// value would exceed the short axis's own ceiling, the long axis slows
/// symmetrically instead.
pub fn plan_coordinated(
    dh: u32,
    dv: u32,
    h: &AxisConstraints,
    v: &AxisConstraints,
    h_ceiling: u32,
    v_ceiling: u32,
) -> (AxisPlan, AxisPlan) {
    match (dh, dv) {
        (0, 0) => (
            AxisPlan {
                distance: 0,
                peak_speed: 0,
            },
            AxisPlan {
                distance: 0,
                peak_speed: 0,
            },
        ),
        (_, 0) => (
            AxisPlan {
                distance: dh,
                peak_speed: h_ceiling,
            },
            AxisPlan {
                distance: 0,
                peak_speed: 0,
            },
        ),
        (0, _) => (
            AxisPlan {
                distance: 0,
                peak_speed: 0,
            },
            AxisPlan {
                distance: dv,
                peak_speed: v_ceiling,
            },
        ),
        _ => {
            let h_is_long = dh >= dv;
            let (long_d, short_d) = if h_is_long { (dh, dv) } else { (dv, dh) };
            let (long_ceiling, short_ceiling, short_floor) = if h_is_long {
                (h_ceiling, v_ceiling, v.min_speed)
            } else {
                (v_ceiling, h_ceiling, h.min_speed)
            };

            let ratio = short_d as f32 / long_d as f32;
            let mut long_peak = long_ceiling as f32;
            let mut short_peak = long_peak * ratio;

            if short_peak > short_ceiling as f32 {
                // Short axis cannot keep up: slow both, same ratio
                let scale = short_ceiling as f32 / short_peak;
                long_peak *= scale;
                short_peak = short_ceiling as f32;
            }

            let long_peak = long_peak as u32;
            let short_peak = (short_peak as u32).max(short_floor);

            if h_is_long {
                (
                    AxisPlan {
                        distance: dh,
                        peak_speed: long_peak,
                    },
                    AxisPlan {
                        distance: dv,
                        peak_speed: short_peak,
                    },
                )
            } else {
                (
                    AxisPlan {
                        distance: dh,
                        peak_speed: short_peak,
                    },
                    AxisPlan {
                        distance: dv,
                        peak_speed: long_peak,
                    },
                )
            }
        }
    }
}
