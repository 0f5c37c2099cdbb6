//! Shared mutable context threaded through every mode handler.
//!
//! `TickContext` is the blackboard each mode reads from and writes to: the
//! tick timestamp, the per-tick input snapshot, the device inventory, the
//! calibrated layout, the diagnostics sink, configuration and a PRNG.
//! Display hints are written by the active mode and consumed by the render
//! surface at the end of the tick.

use crate::config::SystemConfig;
use crate::diagnostics::DiagnosticsLog;
use crate::hardware::HardwareInventory;
use crate::input::InputSnapshot;
use crate::layout::{CalibratedLayout, LayoutItem, Transform};
use crate::pins::Group;
use crate::rng::Rng;
use serde::Serialize;

/// Success/failure tint for the playing mode's result display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// What the rendering collaborator should emphasise this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DisplayHints {
    #[default]
    None,
    /// Self-test progress: how many test buttons are validated.
    SelfTest { validated: usize, total: usize },
    /// Reaction game: whether a cue is lit and the last trial's tint.
    Playing {
        cue_visible: bool,
        outcome: Option<Outcome>,
    },
    /// Measurement: active metadata step (1-3) or running trial number.
    Measurement {
        metadata_step: Option<u8>,
        trial: Option<usize>,
    },
    /// Calibration: the item currently being edited.
    Calibration { item: LayoutItem },
}

pub struct TickContext<'a> {
    /// Milliseconds since process start.
    pub now_ms: u64,
    pub input: &'a InputSnapshot,
    pub inventory: &'a mut HardwareInventory,
    pub layout: &'a mut CalibratedLayout,
    pub diagnostics: &'a mut DiagnosticsLog,
    pub config: &'a SystemConfig,
    pub rng: &'a mut Rng,
    /// Written by the active mode each tick; read by the render surface.
    pub hints: DisplayHints,
}

// ---------------------------------------------------------------------------
// Render surface
// ---------------------------------------------------------------------------

/// One target as the renderer sees it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetVisual {
    pub index: usize,
    pub group: Group,
    pub lit: bool,
    pub transform: Transform,
}

/// Everything the out-of-process renderer consumes per tick.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub targets: Vec<TargetVisual>,
    pub center: Transform,
    pub lives: u8,
    #[serde(skip)]
    pub hints: DisplayHints,
}

/// Assemble the frame from the inventory, layout and the mode's hints.
pub fn render_frame(
    inventory: &HardwareInventory,
    layout: &CalibratedLayout,
    hints: DisplayHints,
) -> RenderFrame {
    let targets = inventory
        .targets()
        .iter()
        .enumerate()
        .map(|(index, t)| TargetVisual {
            index,
            group: t.group(),
            lit: t.is_lit(),
            transform: layout.get(LayoutItem::Target(index)),
        })
        .collect();
    RenderFrame {
        targets,
        center: layout.get(LayoutItem::Center),
        lives: inventory.lives_shown(),
        hints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::tests::{two_target_rows, test_inventory};

    #[test]
    fn frame_reflects_lit_state_and_lives() {
        let mut inv = test_inventory(&two_target_rows());
        inv.show_lives(2).unwrap();
        inv.set_target_led(1, true).unwrap();
        let layout = CalibratedLayout::new(1920.0, 1080.0, inv.target_count());
        let frame = render_frame(&inv, &layout, DisplayHints::None);
        assert_eq!(frame.lives, 2);
        assert!(!frame.targets[0].lit);
        assert!(frame.targets[1].lit);
        assert_eq!(frame.targets.len(), 2);
    }
}
