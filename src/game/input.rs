//! Host-side key-state snapshot.
//!
//! The input poller is an external collaborator; this module only shapes its
//! raw per-key levels into the dense table the device reads. Edge fields
//! (`pressed`, `released`) are recomputed every tick from the transition
//! between the previous and current raw state, so re-reporting a held key
//! never re-fires its press edge.
//!
//! The snapshot is uploaded wholesale before any kernel that reads it is
//! dispatched; no kernel ever observes a partially updated table.

use crate::game::types::{KeyState, KEY_COUNT};

/// Key code of the escape key in the device-side table.
pub const KEY_ESCAPE: usize = 0;

/// Key code of the space bar (ASCII).
pub const KEY_SPACE: usize = b' ' as usize;

/// Dense per-key state table for one tick.
pub struct KeySnapshot {
    keys: [KeyState; KEY_COUNT],
}

impl Default for KeySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySnapshot {
    /// Creates an all-released snapshot.
    pub fn new() -> Self {
        Self {
            keys: [KeyState::default(); KEY_COUNT],
        }
    }

    /// Clears both edge fields on every key.
    ///
    /// Call at the top of a tick when the poller only reports keys whose
    /// level changed; pollers that re-apply every tracked key each tick
    /// (the common case) can skip this, since [`KeySnapshot::apply_raw`]
    /// recomputes edges from the transition.
    pub fn begin_tick(&mut self) {
        for key in self.keys.iter_mut() {
            key.pressed = 0;
            key.released = 0;
        }
    }

    /// Records the raw level of one key for this tick, deriving the edges
    /// from the previous level.
    pub fn apply_raw(&mut self, code: usize, down: bool) {
        let key = &mut self.keys[code & (KEY_COUNT - 1)];
        let was_down = key.down != 0;
        key.down = down as u32;
        key.pressed = (down && !was_down) as u32;
        key.released = (!down && was_down) as u32;
    }

    /// Key code for a printable ASCII character, folded to lower case the
    /// way the device-side table expects.
    pub fn code(ch: char) -> usize {
        (ch.to_ascii_lowercase() as usize) & (KEY_COUNT - 1)
    }

    /// State of one key.
    pub fn key(&self, code: usize) -> KeyState {
        self.keys[code & (KEY_COUNT - 1)]
    }

    /// The full table, in upload order.
    pub fn as_slice(&self) -> &[KeyState] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_snapshot_is_all_zero() {
        let snap = KeySnapshot::new();
        for code in 0..KEY_COUNT {
            assert_eq!(snap.key(code), KeyState::default());
        }
    }

    #[test]
    fn press_edge_fires_once_per_transition() {
        let mut snap = KeySnapshot::new();
        let code = KeySnapshot::code('a');

        // Tick 1: key goes down.
        snap.apply_raw(code, true);
        assert_eq!(snap.key(code).down, 1);
        assert_eq!(snap.key(code).pressed, 1);
        assert_eq!(snap.key(code).released, 0);

        // Tick 2: still held; the edge must not re-fire.
        snap.apply_raw(code, true);
        assert_eq!(snap.key(code).down, 1);
        assert_eq!(snap.key(code).pressed, 0);

        // Tick 3: released.
        snap.apply_raw(code, false);
        assert_eq!(snap.key(code).down, 0);
        assert_eq!(snap.key(code).pressed, 0);
        assert_eq!(snap.key(code).released, 1);

        // Tick 4: still up.
        snap.apply_raw(code, false);
        assert_eq!(snap.key(code).released, 0);
    }

    #[test]
    fn begin_tick_clears_only_edges() {
        let mut snap = KeySnapshot::new();
        snap.apply_raw(KEY_SPACE, true);
        snap.begin_tick();
        assert_eq!(snap.key(KEY_SPACE).down, 1);
        assert_eq!(snap.key(KEY_SPACE).pressed, 0);
        assert_eq!(snap.key(KEY_SPACE).released, 0);
    }

    #[test]
    fn code_folds_case() {
        assert_eq!(KeySnapshot::code('A'), KeySnapshot::code('a'));
        assert_eq!(KeySnapshot::code(' '), KEY_SPACE);
    }
}
