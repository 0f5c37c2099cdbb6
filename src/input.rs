//! Per-tick input snapshot.
//!
//! Built once at the top of every tick from the polled devices and the
//! keyboard adapter, then passed by reference into the active mode. Modes
//! never reach into devices for input state; the snapshot is the single
//! point-in-time truth for the tick.

/// Keyboard key, already decoded by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

impl Key {
    /// Decimal digit value for subject-id entry, if this is a digit key.
    pub fn digit(self) -> Option<u32> {
        match self {
            Self::Char(c) => c.to_digit(10),
            _ => None,
        }
    }
}

/// One button's state at this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonState {
    pub down: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

/// Everything the active mode may consume this tick.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    /// Start/menu button.
    pub start: ButtonState,
    /// Target buttons, indexed like the inventory's target list. Targets
    /// without a press sensor report a default (never-pressed) state.
    pub targets: Vec<ButtonState>,
    /// Keys whose press edge fired this tick.
    pub keys_pressed: Vec<Key>,
    /// Keys currently held (as far as the terminal can tell).
    pub keys_down: Vec<Key>,
}

impl InputSnapshot {
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Index of the single target whose press edge fired this tick, if any.
    pub fn just_pressed_target(&self) -> Option<usize> {
        self.targets.iter().position(|t| t.just_pressed)
    }

    /// Indices of every target button currently down.
    pub fn targets_down(&self) -> impl Iterator<Item = usize> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.down)
            .map(|(i, _)| i)
    }
}
