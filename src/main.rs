//! Stomplight controller, main entry point.
//!
//! Single cooperative tick loop over the device graph and the mode state
//! machine:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  tick (fixed interval)                                   │
//! │                                                          │
//! │  poll devices ─ snapshot inputs ─ mode update ─ render   │
//! │        │                                │                │
//! │  gpioget / gpioset            Boot · Idle · Playing      │
//! │  (one process per             Measurement · Calibration  │
//! │   asserted output)                                       │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use stomplight::adapters::keyboard::KeyboardAdapter;
use stomplight::config::SystemConfig;
use stomplight::diagnostics::DiagnosticsLog;
use stomplight::drivers::registry::PinRegistry;
use stomplight::fsm::context::{render_frame, DisplayHints, TickContext};
use stomplight::fsm::{GameStateMachine, ModeId};
use stomplight::hardware::HardwareInventory;
use stomplight::layout::CalibratedLayout;
use stomplight::pins::board_layout;
use stomplight::rng::Rng;
use stomplight::shutdown;

const CONFIG_PATH: &str = "stomplight.json";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("stomplight v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::load_or_default(Path::new(CONFIG_PATH));

    // ── 3. Device graph ───────────────────────────────────────
    // A pin conflict in the table is fatal: running with ambiguous pin
    // ownership is worse than not running.
    let mut registry = PinRegistry::new(&config);
    let mut inventory = HardwareInventory::build(&board_layout(), &mut registry, &config)
        .context("device graph construction failed")?;
    info!("{} pin(s) claimed", registry.claimed_count());

    // ── 4. Collaborators ──────────────────────────────────────
    let mut layout = CalibratedLayout::new(
        config.canvas_width,
        config.canvas_height,
        inventory.target_count(),
    );
    let mut diagnostics = DiagnosticsLog::new();
    let mut rng = Rng::from_clock();
    let mut keyboard = KeyboardAdapter::new();

    // ── 5. State machine, starting with the hardware self-test ─
    let mut machine = GameStateMachine::new();
    let started = Instant::now();
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
        machine.set_mode(ModeId::Boot, &mut ctx)?;
    }

    // ── 6. Tick loop ──────────────────────────────────────────
    let tick = Duration::from_millis(config.tick_interval_ms);
    let mut last_frame = String::new();
    loop {
        thread::sleep(tick);
        let now_ms = started.elapsed().as_millis() as u64;

        inventory.poll_inputs(now_ms);
        let mut input = inventory.snapshot_buttons();
        input.keys_pressed = keyboard.poll(now_ms);
        input.keys_down = keyboard.held_keys();

        let mut ctx = TickContext {
            now_ms,
            input: &input,
            inventory: &mut inventory,
            layout: &mut layout,
            diagnostics: &mut diagnostics,
            config: &config,
            rng: &mut rng,
            hints: DisplayHints::None,
        };
        let shutdown_requested = machine.update(&mut ctx)?;
        let hints = ctx.hints;

        let frame = render_frame(&inventory, &layout, hints);
        publish_frame(&frame, &mut last_frame);

        if shutdown_requested {
            break;
        }
    }

    // ── 7. Ordered teardown ───────────────────────────────────
    drop(keyboard); // restore the terminal before the final log lines
    shutdown::run(&mut inventory, &diagnostics, &config);
    Ok(())
}

/// Hand the frame to the rendering collaborator. The projection renderer is
/// a separate process consuming JSON lines on stdout; identical consecutive
/// frames are elided.
fn publish_frame(frame: &stomplight::fsm::context::RenderFrame, last: &mut String) {
    match serde_json::to_string(frame) {
        Ok(line) => {
            if line != *last {
                println!("{line}");
                *last = line;
            }
        }
        Err(e) => debug!("frame serialisation failed: {e}"),
    }
}
