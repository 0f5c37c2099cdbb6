//! Hardware inventory: the full device graph built from the pin table.
//!
//! Built exactly once at startup; membership never changes afterwards.
//! Rows are routed by role: life indicators, the start button singleton,
//! and target LED/button pairs joined by id. The inventory is the only
//! owner of devices; modes reach them through it.

use crate::config::SystemConfig;
use crate::drivers::button::Button;
use crate::drivers::led::Led;
use crate::drivers::registry::PinRegistry;
use crate::error::Result;
use crate::input::{ButtonState, InputSnapshot};
use crate::pins::{Group, PinAssignment, PinKind, PinRole, LIFE_FIRING_ORDER};
use log::{info, warn};

pub const LIFE_COUNT: u8 = 3;

/// A playable unit: one indicator (required), one press sensor (optional),
/// and an immutable left/right group tag.
#[derive(Debug)]
pub struct Target {
    id: String,
    group: Group,
    led: Led,
    button: Option<Button>,
}

impl Target {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn led(&mut self) -> &mut Led {
        &mut self.led
    }

    pub fn is_lit(&self) -> bool {
        self.led.is_on()
    }

    pub fn has_button(&self) -> bool {
        self.button.is_some()
    }
}

#[derive(Debug)]
pub struct HardwareInventory {
    /// Life indicators in firing order (first-to-extinguish first).
    life_leds: Vec<Led>,
    start_button: Option<Button>,
    targets: Vec<Target>,
}

impl HardwareInventory {
    /// Build the device graph from the declarative pin table. A pin
    /// conflict aborts construction; startup must not proceed with
    /// ambiguous ownership.
    pub fn build(
        rows: &[PinAssignment],
        registry: &mut PinRegistry,
        config: &SystemConfig,
    ) -> Result<Self> {
        let mut life_leds: Vec<Led> = Vec::new();
        let mut start_button: Option<Button> = None;
        let mut target_leds: Vec<Led> = Vec::new();
        let mut target_buttons: Vec<Button> = Vec::new();
        // Target ids in declaration order, with their group tags.
        let mut target_ids: Vec<(String, Group)> = Vec::new();

        for row in rows {
            match (row.kind, row.role) {
                (PinKind::Led, PinRole::Life) => {
                    let line = registry.create_output(row.pin, row.id)?;
                    life_leds.push(Led::new(row.id, line));
                }
                (PinKind::Button, PinRole::Start) => {
                    if start_button.is_some() {
                        warn!("duplicate start button row '{}' ignored", row.id);
                        continue;
                    }
                    let line = registry.create_input(row.pin, row.id)?;
                    start_button = Some(Button::new(row.id, line, config.debounce_window_ms));
                }
                (PinKind::Led, PinRole::Target) => {
                    let line = registry.create_output(row.pin, row.id)?;
                    target_leds.push(Led::new(row.id, line));
                    if !target_ids.iter().any(|(id, _)| id == row.id) {
                        target_ids.push((row.id.to_string(), row.group));
                    }
                }
                (PinKind::Button, PinRole::Target) => {
                    let line = registry.create_input(row.pin, row.id)?;
                    target_buttons.push(Button::new(row.id, line, config.debounce_window_ms));
                    if !target_ids.iter().any(|(id, _)| id == row.id) {
                        target_ids.push((row.id.to_string(), row.group));
                    }
                }
                (kind, role) => {
                    warn!("pin table row '{}' has unsupported {kind:?}/{role:?} pair, skipped", row.id);
                }
            }
        }

        // Join remembered target ids with their devices. The LED is
        // mandatory; a button-only id is skipped with a warning.
        let mut targets = Vec::new();
        for (id, group) in target_ids {
            let Some(led_idx) = target_leds.iter().position(|l| l.id() == id) else {
                warn!("target '{id}' has no LED row, skipped");
                continue;
            };
            let led = target_leds.swap_remove(led_idx);
            let button = target_buttons
                .iter()
                .position(|b| b.id() == id)
                .map(|i| target_buttons.swap_remove(i));
            targets.push(Target {
                id,
                group,
                led,
                button,
            });
        }

        let life_leds = normalize_life_order(life_leds);

        info!(
            "inventory: {} life indicator(s), {} start button, {} target(s)",
            life_leds.len(),
            usize::from(start_button.is_some()),
            targets.len()
        );

        Ok(Self {
            life_leds,
            start_button,
            targets,
        })
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn target(&mut self, index: usize) -> Option<&mut Target> {
        self.targets.get_mut(index)
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target_index(&self, id: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.id() == id)
    }

    pub fn life_count(&self) -> usize {
        self.life_leds.len()
    }

    pub fn has_start_button(&self) -> bool {
        self.start_button.is_some()
    }

    // -----------------------------------------------------------------------
    // Per-tick input path
    // -----------------------------------------------------------------------

    /// Poll every input device exactly once. Called at the top of each tick.
    pub fn poll_inputs(&mut self, now_ms: u64) {
        if let Some(btn) = &mut self.start_button {
            btn.poll(now_ms);
        }
        for target in &mut self.targets {
            if let Some(btn) = &mut target.button {
                btn.poll(now_ms);
            }
        }
    }

    /// Snapshot the polled button states for the active mode.
    pub fn snapshot_buttons(&self) -> InputSnapshot {
        let start = self
            .start_button
            .as_ref()
            .map(button_state)
            .unwrap_or_default();
        let targets = self
            .targets
            .iter()
            .map(|t| t.button.as_ref().map(button_state).unwrap_or_default())
            .collect();
        InputSnapshot {
            start,
            targets,
            keys_pressed: Vec::new(),
            keys_down: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Aggregate indicator operations
    // -----------------------------------------------------------------------

    /// Show `n` lives (clamped to 0..=3): indicator at firing position `i`
    /// is lit iff `n >= 3 - i`, so losing a life extinguishes position 0
    /// first.
    pub fn show_lives(&mut self, n: u8) -> Result<()> {
        let n = n.min(LIFE_COUNT);
        let total = self.life_leds.len() as u8;
        for (i, led) in self.life_leds.iter_mut().enumerate() {
            led.set(n >= total - i as u8)?;
        }
        Ok(())
    }

    pub fn set_life_led(&mut self, index: usize, on: bool) -> Result<()> {
        if let Some(led) = self.life_leds.get_mut(index) {
            led.set(on)?;
        }
        Ok(())
    }

    /// The two outermost life indicators, the start button's held-feedback
    /// in the self-test.
    pub fn set_outer_life_leds(&mut self, on: bool) -> Result<()> {
        let last = self.life_leds.len().saturating_sub(1);
        self.set_life_led(0, on)?;
        if last > 0 {
            self.set_life_led(last, on)?;
        }
        Ok(())
    }

    pub fn set_target_led(&mut self, index: usize, on: bool) -> Result<()> {
        if let Some(target) = self.targets.get_mut(index) {
            target.led.set(on)?;
        }
        Ok(())
    }

    pub fn set_all(&mut self, on: bool) -> Result<()> {
        for led in &mut self.life_leds {
            led.set(on)?;
        }
        for target in &mut self.targets {
            target.led.set(on)?;
        }
        Ok(())
    }

    pub fn all_off(&mut self) -> Result<()> {
        self.set_all(false)
    }

    pub fn targets_off(&mut self) -> Result<()> {
        for target in &mut self.targets {
            target.led.set(false)?;
        }
        Ok(())
    }

    /// Lives currently shown, derived from the lit indicators.
    pub fn lives_shown(&self) -> u8 {
        self.life_leds.iter().filter(|l| l.is_on()).count() as u8
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Release every held output process. Each failure is isolated and
    /// logged; the sweep always reaches every device.
    pub fn shutdown_all(&mut self) {
        for led in &mut self.life_leds {
            if let Err(e) = led.shutdown() {
                warn!("shutdown of life LED '{}' failed: {e}", led.id());
            }
        }
        for target in &mut self.targets {
            if let Err(e) = target.led.shutdown() {
                warn!("shutdown of target LED '{}' failed: {e}", target.led.id());
            }
        }
    }
}

fn button_state(btn: &Button) -> ButtonState {
    ButtonState {
        down: btn.is_down(),
        just_pressed: btn.just_pressed(),
        just_released: btn.just_released(),
    }
}

/// Reorder the life list into the fixed firing sequence when the three
/// canonical ids are all present; otherwise keep discovery order.
fn normalize_life_order(life_leds: Vec<Led>) -> Vec<Led> {
    let all_present = LIFE_FIRING_ORDER
        .iter()
        .all(|id| life_leds.iter().any(|l| l.id() == *id));
    if !all_present {
        return life_leds;
    }

    let mut remaining = life_leds;
    let mut ordered = Vec::with_capacity(remaining.len());
    for id in LIFE_FIRING_ORDER {
        if let Some(i) = remaining.iter().position(|l| l.id() == id) {
            ordered.push(remaining.swap_remove(i));
        }
    }
    // Non-canonical extras keep their discovery order at the tail.
    ordered.append(&mut remaining);
    ordered
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pins::PinAssignment;

    /// Inventory whose drivers run against in-memory fakes, for tests that
    /// must not spawn processes.
    pub fn test_inventory(rows: &[PinAssignment]) -> HardwareInventory {
        test_inventory_with_inputs(rows).0
    }

    /// Same, plus the pressed-state map for scripting button activity.
    pub fn test_inventory_with_inputs(
        rows: &[PinAssignment],
    ) -> (HardwareInventory, crate::drivers::testutil::PressedMap) {
        let config = SystemConfig::default();
        let (mut registry, pressed) = crate::drivers::testutil::mock_registry();
        let inv = HardwareInventory::build(rows, &mut registry, &config).unwrap();
        (inv, pressed)
    }

    pub fn two_target_rows() -> Vec<PinAssignment> {
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
        ]
    }

    #[test]
    fn life_order_normalizes_to_firing_sequence() {
        // Table declares life3/life2/life1, already the firing order, but
        // shuffle to prove the reorder.
        use PinKind::Led as L;
        use PinRole::Life;
        let rows = vec![
            PinAssignment::new("life1", L, Life, 13, Group::None),
            PinAssignment::new("life3", L, Life, 5, Group::None),
            PinAssignment::new("life2", L, Life, 6, Group::None),
        ];
        let mut inv = test_inventory(&rows);
        inv.show_lives(1).unwrap();
        // One life: only the last firing position (life1) is lit.
        assert_eq!(inv.lives_shown(), 1);
        inv.show_lives(3).unwrap();
        assert_eq!(inv.lives_shown(), 3);
    }

    #[test]
    fn show_lives_clamps_and_orders() {
        let mut inv = test_inventory(&two_target_rows());
        inv.show_lives(7).unwrap(); // clamped to 3
        assert_eq!(inv.lives_shown(), 3);
        inv.show_lives(0).unwrap();
        assert_eq!(inv.lives_shown(), 0);
        inv.show_lives(2).unwrap();
        assert_eq!(inv.lives_shown(), 2);
    }

    #[test]
    fn button_only_target_is_skipped() {
        use Group::Left;
        let rows = vec![PinAssignment::new(
            "ghost",
            PinKind::Button,
            PinRole::Target,
            19,
            Left,
        )];
        let inv = test_inventory(&rows);
        assert_eq!(inv.target_count(), 0);
    }

    #[test]
    fn targets_join_leds_and_buttons_by_id() {
        let inv = test_inventory(&two_target_rows());
        assert_eq!(inv.target_count(), 2);
        assert_eq!(inv.target_index("t1"), Some(0));
        assert_eq!(inv.target_index("t2"), Some(1));
        assert!(inv.targets()[0].has_button());
        assert_eq!(inv.targets()[0].group(), Group::Left);
        assert_eq!(inv.targets()[1].group(), Group::Right);
    }

    #[test]
    fn snapshot_matches_target_count() {
        let inv = test_inventory(&two_target_rows());
        let snap = inv.snapshot_buttons();
        assert_eq!(snap.targets.len(), 2);
        assert!(!snap.start.down);
    }
}
