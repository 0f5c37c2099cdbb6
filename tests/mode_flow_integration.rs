//! Full-stack mode flow: pin table -> devices -> state machine, driven
//! tick by tick against fake line backends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use stomplight::config::SystemConfig;
use stomplight::diagnostics::DiagnosticsLog;
use stomplight::drivers::command::{Bias, HeldLevel, LineHold, LineQuery};
use stomplight::drivers::registry::PinRegistry;
use stomplight::error::Result;
use stomplight::fsm::context::{DisplayHints, TickContext};
use stomplight::fsm::{GameStateMachine, ModeId};
use stomplight::hardware::HardwareInventory;
use stomplight::layout::CalibratedLayout;
use stomplight::pins::board_layout;
use stomplight::rng::Rng;

type Pressed = Rc<RefCell<HashMap<u8, bool>>>;

struct FakeQuery {
    pressed: Pressed,
}

impl LineQuery for FakeQuery {
    fn sample(&self, _bias: Bias, pin: u8) -> Result<String> {
        let held = self.pressed.borrow().get(&pin).copied().unwrap_or(false);
        Ok(if held { "0".into() } else { "1".into() })
    }
}

struct FakeHandle;

impl HeldLevel for FakeHandle {
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

struct FakeHold;

impl LineHold for FakeHold {
    fn hold(&self, _pin: u8, _high: bool) -> Result<Box<dyn HeldLevel>> {
        Ok(Box::new(FakeHandle))
    }
}

/// Everything `main` wires together, compressed for scripted sessions.
struct Session {
    inventory: HardwareInventory,
    pressed: Pressed,
    layout: CalibratedLayout,
    diagnostics: DiagnosticsLog,
    config: SystemConfig,
    rng: Rng,
    machine: GameStateMachine,
    now_ms: u64,
    shutdown: bool,
}

impl Session {
    fn boot() -> Self {
        let pressed: Pressed = Rc::new(RefCell::new(HashMap::new()));
        let map = pressed.clone();
        let mut registry = PinRegistry::with_backends(
            Box::new(move || {
                Box::new(FakeQuery {
                    pressed: map.clone(),
                })
            }),
            Box::new(|| Box::new(FakeHold)),
        );
        let config = SystemConfig::default();
        let mut inventory =
            HardwareInventory::build(&board_layout(), &mut registry, &config).unwrap();
        let mut layout = CalibratedLayout::new(
            config.canvas_width,
            config.canvas_height,
            inventory.target_count(),
        );
        let mut diagnostics = DiagnosticsLog::new();
        let mut rng = Rng::seeded(20_002);
        let mut machine = GameStateMachine::new();
        {
            let input = stomplight::input::InputSnapshot::default();
            let mut ctx = TickContext {
                now_ms: 0,
                input: &input,
                inventory: &mut inventory,
                layout: &mut layout,
                diagnostics: &mut diagnostics,
                config: &config,
                rng: &mut rng,
                hints: DisplayHints::None,
            };
            machine.set_mode(ModeId::Boot, &mut ctx).unwrap();
        }
        Self {
            inventory,
            pressed,
            layout,
            diagnostics,
            config,
            rng,
            machine,
            now_ms: 0,
            shutdown: false,
        }
    }

    fn tick(&mut self) {
        self.now_ms += self.config.tick_interval_ms;
        self.inventory.poll_inputs(self.now_ms);
        let input = self.inventory.snapshot_buttons();
        let mut ctx = TickContext {
            now_ms: self.now_ms,
            input: &input,
            inventory: &mut self.inventory,
            layout: &mut self.layout,
            diagnostics: &mut self.diagnostics,
            config: &self.config,
            rng: &mut self.rng,
            hints: DisplayHints::None,
        };
        self.shutdown |= self.machine.update(&mut ctx).unwrap();
    }

    fn run_ms(&mut self, duration_ms: u64) {
        let end = self.now_ms + duration_ms;
        while self.now_ms < end {
            self.tick();
        }
    }

    fn press(&mut self, pin: u8) {
        self.pressed.borrow_mut().insert(pin, true);
    }

    fn release(&mut self, pin: u8) {
        self.pressed.borrow_mut().insert(pin, false);
    }

    fn click(&mut self, pin: u8) {
        self.press(pin);
        self.run_ms(self.config.debounce_window_ms + 60);
        self.release(pin);
        self.run_ms(self.config.debounce_window_ms + 20);
    }

    /// Run the whole self-test: wait out the sweep, validate every test
    /// button, wait out the completion blink.
    fn complete_self_test(&mut self) {
        // Delay + per-indicator sweep, with generous tick slack.
        let per_blink = self.config.boot_blink_on_ms + self.config.boot_blink_off_ms;
        let indicators = (self.inventory.life_count() + self.inventory.target_count()) as u64;
        let sweep = self.config.boot_delay_ms
            + indicators
                * (u64::from(self.config.boot_sweep_blinks) * per_blink
                    + self.config.boot_sweep_gap_ms)
            + 2000;
        self.run_ms(sweep);

        let confirm =
            u64::from(self.config.boot_confirm_blinks) * per_blink + 300;
        // Start button, then each target button (pins from the board table).
        self.click(12);
        self.run_ms(confirm);
        for pin in [16, 23, 27, 25, 7, 21] {
            self.click(pin);
            self.run_ms(confirm);
        }
        // Completion blink.
        self.run_ms(confirm + 500);
    }
}

#[test]
fn self_test_hands_over_to_idle() {
    let mut session = Session::boot();
    assert_eq!(session.machine.current_id(), Some(ModeId::Boot));
    session.complete_self_test();
    assert_eq!(session.machine.current_id(), Some(ModeId::Idle));
    // Everything dark after the handover.
    assert_eq!(session.inventory.lives_shown(), 0);
    assert!(session.inventory.targets().iter().all(|t| !t.is_lit()));
}

#[test]
fn single_click_from_idle_starts_the_game_with_full_lives() {
    let mut session = Session::boot();
    session.complete_self_test();

    session.click(12);
    session.run_ms(session.config.multi_click_window_ms + 100);
    assert_eq!(session.machine.current_id(), Some(ModeId::Playing));
    assert_eq!(session.inventory.lives_shown(), 3);
}

#[test]
fn long_press_from_idle_requests_shutdown() {
    let mut session = Session::boot();
    session.complete_self_test();

    session.press(12);
    session.run_ms(session.config.long_press_ms + 200);
    assert!(session.shutdown);

    // The release of the long press never dispatches a mode.
    session.shutdown = false;
    session.release(12);
    session.run_ms(session.config.multi_click_window_ms + 200);
    assert_eq!(session.machine.current_id(), Some(ModeId::Idle));
    assert!(!session.shutdown);

    // Nothing was recorded, so the export sink stays empty.
    assert!(session.diagnostics.is_empty());
}
