//! Tick-driven blink sequences.
//!
//! A `BlinkSequence` owns a set of indicators and toggles them over
//! successive ticks until the requested number of on-phases has played out.
//! The owning mode advances nothing else while a sequence is running, which
//! keeps the old guarantee that a feedback blink completes before the next
//! phase begins, without ever blocking the tick loop.

use crate::error::Result;
use crate::hardware::HardwareInventory;

/// Which indicators a sequence drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkSet {
    /// Every LED in the inventory.
    All,
    /// One life LED.
    Life(usize),
    /// The two outer life LEDs only.
    OuterLives,
    /// One target LED.
    Target(usize),
}

#[derive(Debug)]
pub struct BlinkSequence {
    set: BlinkSet,
    remaining: u32,
    on_ms: u64,
    off_ms: u64,
    lit: bool,
    next_ms: u64,
    started: bool,
}

impl BlinkSequence {
    pub fn new(set: BlinkSet, count: u32, on_ms: u64, off_ms: u64) -> Self {
        Self {
            set,
            remaining: count,
            on_ms,
            off_ms,
            lit: false,
            next_ms: 0,
            started: false,
        }
    }

    /// Advance the sequence. Returns `true` once finished; the set is left
    /// dark. A zero-count sequence finishes on its first tick.
    pub fn tick(&mut self, now_ms: u64, inventory: &mut HardwareInventory) -> Result<bool> {
        if !self.started {
            self.started = true;
            if self.remaining == 0 {
                return Ok(true);
            }
            self.apply(inventory, true)?;
            self.lit = true;
            self.next_ms = now_ms + self.on_ms;
            return Ok(false);
        }
        if self.finished() {
            return Ok(true);
        }
        if now_ms < self.next_ms {
            return Ok(false);
        }
        if self.lit {
            self.apply(inventory, false)?;
            self.lit = false;
            self.remaining -= 1;
            if self.finished() {
                return Ok(true);
            }
            self.next_ms = now_ms + self.off_ms;
        } else {
            self.apply(inventory, true)?;
            self.lit = true;
            self.next_ms = now_ms + self.on_ms;
        }
        Ok(false)
    }

    pub fn finished(&self) -> bool {
        self.started && self.remaining == 0 && !self.lit
    }

    fn apply(&self, inventory: &mut HardwareInventory, on: bool) -> Result<()> {
        match self.set {
            BlinkSet::All => inventory.set_all(on),
            BlinkSet::Life(index) => inventory.set_life_led(index, on),
            BlinkSet::OuterLives => inventory.set_outer_life_leds(on),
            BlinkSet::Target(index) => inventory.set_target_led(index, on),
        }
    }
}
