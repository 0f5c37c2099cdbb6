//! Ordered process teardown.
//!
//! Runs once, triggered by the idle long-press. Every step is best-effort
//! and isolated: a failed export or a stuck holder process never prevents
//! the remaining steps from running. The feedback blink here is blocking,
//! which is fine outside the tick loop.

use crate::config::SystemConfig;
use crate::diagnostics::DiagnosticsLog;
use crate::hardware::HardwareInventory;
use log::{info, warn};
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

const FEEDBACK_BLINKS: u32 = 2;
const BLINK_ON_MS: u64 = 150;
const BLINK_OFF_MS: u64 = 100;
const KILL_GRACE_MS: u64 = 500;

/// Export diagnostics, blink goodbye, release every device, then reap any
/// holder process the device sweep left behind.
pub fn run(inventory: &mut HardwareInventory, diagnostics: &DiagnosticsLog, config: &SystemConfig) {
    info!("shutdown: exporting {} diagnostic record(s)", diagnostics.len());
    diagnostics.export_best_effort(Path::new(&config.export_path));

    blink_goodbye(inventory);

    inventory.shutdown_all();

    reap_orphaned_holders(&config.hold_program);

    info!("shutdown: complete");
}

fn blink_goodbye(inventory: &mut HardwareInventory) {
    for _ in 0..FEEDBACK_BLINKS {
        if let Err(e) = inventory.set_all(true) {
            warn!("shutdown blink failed: {e}");
            return;
        }
        thread::sleep(Duration::from_millis(BLINK_ON_MS));
        if let Err(e) = inventory.set_all(false) {
            warn!("shutdown blink failed: {e}");
            return;
        }
        thread::sleep(Duration::from_millis(BLINK_OFF_MS));
    }
}

/// Kill any holder process that survived the device sweep: graceful signal
/// first, then forced. `pkill` exits non-zero when nothing matched, which
/// is the expected outcome.
fn reap_orphaned_holders(hold_program: &str) {
    match Command::new("pkill").args(["-TERM", "-x", hold_program]).status() {
        Ok(status) if status.success() => {
            info!("shutdown: orphaned {hold_program} processes signalled");
            thread::sleep(Duration::from_millis(KILL_GRACE_MS));
            if let Err(e) = Command::new("pkill").args(["-KILL", "-x", hold_program]).status() {
                warn!("forced kill of {hold_program} failed to launch: {e}");
            }
        }
        Ok(_) => {} // nothing matched
        Err(e) => warn!("pkill not available ({e}), skipping holder cleanup"),
    }
}
