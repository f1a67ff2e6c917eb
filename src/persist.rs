//! Non-volatile state for the auxiliary actuators.
//!
//! Servo angles and the gripper position survive power cycles in a small
//! EEPROM-like cell. A one-byte magic cookie distinguishes first boot from
//! a stale cell. Writes go through `update_byte`, which skips bytes that
//! already hold the value, so a completed motion that changed nothing costs
//! no erase cycles.

/// Byte-addressed non-volatile storage capability.
pub trait NvStore {
    /// Read one byte.
    fn read_byte(&mut self, addr: usize) -> u8;

    /// Write one byte unconditionally.
    fn write_byte(&mut self, addr: usize, value: u8);

    /// Write only when the cell differs from `value`.
    fn update_byte(&mut self, addr: usize, value: u8) {
        if self.read_byte(addr) != value {
            self.write_byte(addr, value);
        }
    }
}

/// Cell layout.
mod layout {
    pub const MAGIC: usize = 0;
    pub const SERVO1: usize = 1;
    pub const SERVO2: usize = 2;
    pub const GRIPPER_STEPS_LO: usize = 3;
    pub const GRIPPER_STEPS_HI: usize = 4;
    pub const GRIPPER_CLOSED: usize = 5;
}

/// Cookie marking an initialized cell.
pub const MAGIC_VALUE: u8 = 0xA5;

/// Total bytes used by the layout.
pub const STORE_LEN: usize = 6;

/// Actuator state restored at boot and saved on completed motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedState {
    /// Shoulder servo angle in degrees.
    pub servo1: u8,
    /// Elbow servo angle in degrees.
    pub servo2: u8,
    /// Gripper position in half-steps from fully open.
    pub gripper_steps: u16,
    /// Whether the gripper finished closed.
    pub gripper_closed: bool,
}

/// Load the persisted state; `None` on first boot or a stale cell.
pub fn load<S: NvStore>(store: &mut S) -> Option<PersistedState> {
    if store.read_byte(layout::MAGIC) != MAGIC_VALUE {
        return None;
    }

    let servo1 = store.read_byte(layout::SERVO1);
    let servo2 = store.read_byte(layout::SERVO2);
    if servo1 > 180 || servo2 > 180 {
        return None;
    }

    let gripper_steps = u16::from_le_bytes([
        store.read_byte(layout::GRIPPER_STEPS_LO),
        store.read_byte(layout::GRIPPER_STEPS_HI),
    ]);

    Some(PersistedState {
        servo1,
        servo2,
        gripper_steps,
        gripper_closed: store.read_byte(layout::GRIPPER_CLOSED) != 0,
    })
}

/// Save the state, touching only changed cells.
pub fn save<S: NvStore>(store: &mut S, state: &PersistedState) {
    let [lo, hi] = state.gripper_steps.to_le_bytes();
    store.update_byte(layout::SERVO1, state.servo1);
    store.update_byte(layout::SERVO2, state.servo2);
    store.update_byte(layout::GRIPPER_STEPS_LO, lo);
    store.update_byte(layout::GRIPPER_STEPS_HI, hi);
    store.update_byte(layout::GRIPPER_CLOSED, state.gripper_closed as u8);
    store.update_byte(layout::MAGIC, MAGIC_VALUE);
}

/// RAM-backed store for hosts and tests.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    bytes: [u8; STORE_LEN],
    /// Physical writes performed; exposed so tests can check coalescing.
    pub writes: u32,
}

impl MemoryStore {
    /// A blank (all 0xFF, erased-EEPROM-like) store.
    pub fn new() -> Self {
        Self {
            bytes: [0xFF; STORE_LEN],
            writes: 0,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NvStore for MemoryStore {
    fn read_byte(&mut self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(0xFF)
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        if let Some(cell) = self.bytes.get_mut(addr) {
            *cell = value;
            self.writes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_boot_has_no_state() {
        let mut store = MemoryStore::new();
        assert!(load(&mut store).is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = MemoryStore::new();
        let state = PersistedState {
            servo1: 45,
            servo2: 135,
            gripper_steps: 300,
            gripper_closed: true,
        };

        save(&mut store, &state);
        assert_eq!(load(&mut store), Some(state));
    }

    #[test]
    fn test_corrupt_angles_treated_as_stale() {
        let mut store = MemoryStore::new();
        save(
            &mut store,
            &PersistedState {
                servo1: 90,
                servo2: 90,
                gripper_steps: 0,
                gripper_closed: false,
            },
        );
        store.write_byte(1, 250);
        assert!(load(&mut store).is_none());
    }

    #[test]
    fn test_unchanged_save_writes_nothing() {
        let mut store = MemoryStore::new();
        let state = PersistedState {
            servo1: 90,
            servo2: 90,
            gripper_steps: 10,
            gripper_closed: false,
        };

        save(&mut store, &state);
        let writes_after_first = store.writes;

        save(&mut store, &state);
        assert_eq!(store.writes, writes_after_first);
    }
}
