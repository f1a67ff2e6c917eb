//! End-of-travel limit supervision.
//!
//! Four normally-closed switches with pull-ups, one per travel extreme,
//! polled from the profile tick. A per-switch saturating counter debounces
//! contact bounce; a single released sample resets it, so the supervisor is
//! self-healing. The supervisor is the sole writer of the triggered state;
//! everything else reads snapshots.

use embedded_hal::digital::InputPin;

use crate::axis::Direction;

/// One travel extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitSide {
    /// Horizontal origin side.
    HMin,
    /// Horizontal far side.
    HMax,
    /// Vertical origin side.
    VMin,
    /// Vertical far side.
    VMax,
}

impl LimitSide {
    /// Wire spelling used in events (`LIMIT_H_MIN_TRIGGERED` etc.).
    pub fn wire_name(self) -> &'static str {
        match self {
            LimitSide::HMin => "H_MIN",
            LimitSide::HMax => "H_MAX",
            LimitSide::VMin => "V_MIN",
            LimitSide::VMax => "V_MAX",
        }
    }
}

/// Raw pressed/released sample of all four switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitSample {
    /// Horizontal origin switch pressed.
    pub h_min: bool,
    /// Horizontal far switch pressed.
    pub h_max: bool,
    /// Vertical origin switch pressed.
    pub v_min: bool,
    /// Vertical far switch pressed.
    pub v_max: bool,
}

/// Debounced triggered state of all four switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitState {
    /// Horizontal origin switch triggered.
    pub h_min: bool,
    /// Horizontal far switch triggered.
    pub h_max: bool,
    /// Vertical origin switch triggered.
    pub v_min: bool,
    /// Vertical far switch triggered.
    pub v_max: bool,
}

impl LimitState {
    /// Whether any switch is triggered.
    pub fn any(&self) -> bool {
        self.h_min || self.h_max || self.v_min || self.v_max
    }
}

/// Source of raw limit samples.
///
/// Implemented by [`LimitInputs`] over embedded-hal pins, or directly by a
/// platform (and by test fixtures).
pub trait LimitSense {
    /// Read all four switches. Pressed means the contact is held.
    fn sample(&mut self) -> LimitSample;
}

/// Active-low limit inputs over embedded-hal pins.
///
/// The switches are wired normally closed to ground with pull-ups; a read
/// error keeps the previous sample for that switch.
pub struct LimitInputs<HN, HX, VN, VX>
where
    HN: InputPin,
    HX: InputPin,
    VN: InputPin,
    VX: InputPin,
{
    h_min: HN,
    h_max: HX,
    v_min: VN,
    v_max: VX,
    last: LimitSample,
}

impl<HN, HX, VN, VX> LimitInputs<HN, HX, VN, VX>
where
    HN: InputPin,
    HX: InputPin,
    VN: InputPin,
    VX: InputPin,
{
    /// Wrap the four switch pins.
    pub fn new(h_min: HN, h_max: HX, v_min: VN, v_max: VX) -> Self {
        Self {
            h_min,
            h_max,
            v_min,
            v_max,
            last: LimitSample::default(),
        }
    }
}

impl<HN, HX, VN, VX> LimitSense for LimitInputs<HN, HX, VN, VX>
where
    HN: InputPin,
    HX: InputPin,
    VN: InputPin,
    VX: InputPin,
{
    fn sample(&mut self) -> LimitSample {
        self.last = LimitSample {
            h_min: self.h_min.is_low().unwrap_or(self.last.h_min),
            h_max: self.h_max.is_low().unwrap_or(self.last.h_max),
            v_min: self.v_min.is_low().unwrap_or(self.last.v_min),
            v_max: self.v_max.is_low().unwrap_or(self.last.v_max),
        };
        self.last
    }
}

/// Debounce state for one switch.
#[derive(Debug, Clone, Copy, Default)]
struct DebouncedSwitch {
    counter: u8,
    triggered: bool,
}

impl DebouncedSwitch {
    /// Feed one sample; returns `true` on the released→triggered edge.
    fn update(&mut self, pressed: bool, threshold: u8) -> bool {
        if pressed {
            if self.counter < threshold {
                self.counter += 1;
                if self.counter == threshold && !self.triggered {
                    self.triggered = true;
                    return true;
                }
            }
        } else {
            self.counter = 0;
            self.triggered = false;
        }
        false
    }
}

/// Debounced reader and motion veto for the four end switches.
pub struct LimitSupervisor {
    switches: [DebouncedSwitch; 4],
    threshold: u8,
}

impl LimitSupervisor {
    /// Consecutive pressed samples required to trigger.
    pub const DEFAULT_THRESHOLD: u8 = 3;

    /// Create a supervisor with the default debounce threshold.
    pub fn new() -> Self {
        Self::with_threshold(Self::DEFAULT_THRESHOLD)
    }

    /// Create a supervisor with an explicit debounce threshold.
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            switches: [DebouncedSwitch::default(); 4],
            threshold: threshold.max(1),
        }
    }

    /// Feed one raw sample; returns the sides that newly triggered this
    /// tick, in fixed H-min, H-max, V-min, V-max order.
    pub fn poll(&mut self, sample: LimitSample) -> heapless::Vec<LimitSide, 4> {
        let mut edges = heapless::Vec::new();
        let inputs = [
            (LimitSide::HMin, sample.h_min),
            (LimitSide::HMax, sample.h_max),
            (LimitSide::VMin, sample.v_min),
            (LimitSide::VMax, sample.v_max),
        ];

        for (i, (side, pressed)) in inputs.into_iter().enumerate() {
            if self.switches[i].update(pressed, self.threshold) {
                let _ = edges.push(side);
            }
        }

        edges
    }

    /// Snapshot of the debounced state.
    pub fn state(&self) -> LimitState {
        LimitState {
            h_min: self.switches[0].triggered,
            h_max: self.switches[1].triggered,
            v_min: self.switches[2].triggered,
            v_max: self.switches[3].triggered,
        }
    }

    /// Whether horizontal motion in `direction` is allowed. Motion away
    /// from a triggered switch stays allowed so the operator can back off.
    pub fn check_h(&self, direction: Direction) -> bool {
        self.blocking_h(direction).is_none()
    }

    /// Whether vertical motion in `direction` is allowed.
    pub fn check_v(&self, direction: Direction) -> bool {
        self.blocking_v(direction).is_none()
    }

    /// The switch vetoing horizontal motion in `direction`, if any.
    pub fn blocking_h(&self, direction: Direction) -> Option<LimitSide> {
        let state = self.state();
        match direction {
            Direction::Forward if state.h_max => Some(LimitSide::HMax),
            Direction::Reverse if state.h_min => Some(LimitSide::HMin),
            _ => None,
        }
    }

    /// The switch vetoing vertical motion in `direction`, if any.
    pub fn blocking_v(&self, direction: Direction) -> Option<LimitSide> {
        let state = self.state();
        match direction {
            Direction::Forward if state.v_max => Some(LimitSide::VMax),
            Direction::Reverse if state.v_min => Some(LimitSide::VMin),
            _ => None,
        }
    }
}

impl Default for LimitSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
