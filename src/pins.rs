//! GPIO pin assignments for the installation floor board.
//!
//! Single source of truth: the hardware inventory is built from this table
//! once at startup and every driver claims its pin through it. Change a pin
//! here and it propagates everywhere.
//!
//! BCM numbering (chip-level GPIO index), not physical header positions.

/// What kind of line a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    /// Two-state output driving an indicator.
    Led,
    /// Momentary input sampling a press sensor.
    Button,
}

/// What the device is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    /// One of the three life indicators.
    Life,
    /// The single start/menu button.
    Start,
    /// A playable floor target (LED required, button optional).
    Target,
}

/// Left/right footwork grouping for targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Group {
    Left,
    Right,
    None,
}

/// One row of the declarative pin table.
#[derive(Debug, Clone)]
pub struct PinAssignment {
    pub id: &'static str,
    pub kind: PinKind,
    pub role: PinRole,
    pub pin: u8,
    pub group: Group,
}

impl PinAssignment {
    pub const fn new(id: &'static str, kind: PinKind, role: PinRole, pin: u8, group: Group) -> Self {
        Self {
            id,
            kind,
            role,
            pin,
            group,
        }
    }
}

/// Canonical ids of the three life indicators in firing order
/// (first-to-extinguish first). The inventory reorders its life list into
/// this sequence when all three are present.
pub const LIFE_FIRING_ORDER: [&str; 3] = ["life3", "life2", "life1"];

/// The production floor layout: three life LEDs, one start button, and six
/// targets alternating left/right, each with its own press sensor.
pub fn board_layout() -> Vec<PinAssignment> {
    use Group::{Left, None as NoGroup, Right};
    use PinKind::{Button, Led};
    use PinRole::{Life, Start, Target};

    vec![
        PinAssignment::new("life3", Led, Life, 5, NoGroup),
        PinAssignment::new("life2", Led, Life, 6, NoGroup),
        PinAssignment::new("life1", Led, Life, 13, NoGroup),
        PinAssignment::new("start", Button, Start, 12, NoGroup),
        PinAssignment::new("t1", Led, Target, 26, Left),
        PinAssignment::new("t1", Button, Target, 16, Left),
        PinAssignment::new("t2", Led, Target, 22, Right),
        PinAssignment::new("t2", Button, Target, 23, Right),
        PinAssignment::new("t3", Led, Target, 17, Left),
        PinAssignment::new("t3", Button, Target, 27, Left),
        PinAssignment::new("t4", Led, Target, 24, Right),
        PinAssignment::new("t4", Button, Target, 25, Right),
        PinAssignment::new("t5", Led, Target, 8, Left),
        PinAssignment::new("t5", Button, Target, 7, Left),
        PinAssignment::new("t6", Led, Target, 20, Right),
        PinAssignment::new("t6", Button, Target, 21, Right),
    ]
}
