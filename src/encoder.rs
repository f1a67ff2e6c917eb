//! Diagnostic quadrature encoders.
//!
//! The gantry carries one encoder per axis for drift comparison against the
//! commanded step counters. They take no part in motion control; the host
//! reads both counts and judges slippage itself.

/// Transition table indexed by `(previous_state << 2) | state`, where a
/// state is `(clk << 1) | dt`. Invalid transitions (both channels changed)
/// decode to zero, which silently rejects glitches.
const TRANSITION_TABLE: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Incremental quadrature decoder for one axis.
#[derive(Debug, Clone, Copy)]
pub struct QuadratureDecoder {
    last_state: u8,
    count: i32,
    glitches: u32,
}

impl QuadratureDecoder {
    /// Create a decoder seeded with the current channel levels.
    pub fn new(clk: bool, dt: bool) -> Self {
        Self {
            last_state: state_of(clk, dt),
            count: 0,
            glitches: 0,
        }
    }

    /// Feed one sample of both channels; returns the count delta (−1, 0
    /// or +1). Call from the pin-change ISR.
    pub fn update(&mut self, clk: bool, dt: bool) -> i8 {
        let state = state_of(clk, dt);
        let index = ((self.last_state << 2) | state) as usize;
        let delta = TRANSITION_TABLE[index];

        if delta == 0 && state != self.last_state {
            // Both channels flipped in one sample
            self.glitches = self.glitches.wrapping_add(1);
        }

        self.last_state = state;
        self.count += delta as i32;
        delta
    }

    /// Accumulated count.
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Number of rejected invalid transitions.
    pub fn glitches(&self) -> u32 {
        self.glitches
    }

    /// Reset the count (new move origin).
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

fn state_of(clk: bool, dt: bool) -> u8 {
    ((clk as u8) << 1) | dt as u8
}
