//! Output line driven through the held-process model.
//!
//! A dedicated external process asserts each level; the process lifetime is
//! the assertion lifetime. Setting the same level twice is a no-op, changing
//! level replaces the process, so at most one holder exists per line at any
//! instant.
//!
//! A failed hold is correctness-critical (an indicator stuck dark mid-game)
//! and is propagated, unlike input sampling which degrades per tick.

use crate::drivers::command::{HeldLevel, LineHold};
use crate::error::Result;
use log::warn;

pub struct OutputLine {
    pin: u8,
    inverted: bool,
    current_high: bool,
    has_value: bool,
    held: Option<Box<dyn HeldLevel>>,
    hold: Box<dyn LineHold>,
}

impl std::fmt::Debug for OutputLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputLine")
            .field("pin", &self.pin)
            .field("inverted", &self.inverted)
            .field("current_high", &self.current_high)
            .field("has_value", &self.has_value)
            .finish_non_exhaustive()
    }
}

impl OutputLine {
    /// Construct and immediately apply the start level.
    pub fn new(pin: u8, start_on: bool, inverted: bool, hold: Box<dyn LineHold>) -> Result<Self> {
        let mut line = Self {
            pin,
            inverted,
            current_high: false,
            has_value: false,
            held: None,
            hold,
        };
        line.set(start_on)?;
        Ok(line)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn set_high(&mut self) -> Result<()> {
        self.set(true)
    }

    pub fn set_low(&mut self) -> Result<()> {
        self.set(false)
    }

    /// Logical on/off state (inversion already accounted for).
    pub fn is_high(&self) -> bool {
        self.has_value && (self.current_high != self.inverted)
    }

    fn set(&mut self, logical_high: bool) -> Result<()> {
        let level = logical_high != self.inverted;
        self.set_value_physical(level)
    }

    /// Idempotent physical level set: replace the holder only on change.
    fn set_value_physical(&mut self, level: bool) -> Result<()> {
        if self.has_value && self.current_high == level {
            return Ok(());
        }

        if let Some(mut held) = self.held.take() {
            if let Err(e) = held.stop() {
                // The replacement spawn below re-establishes exclusive
                // ownership either way; the stop failure is not fatal.
                warn!("pin {}: stopping old holder failed: {e}", self.pin);
            }
        }

        self.held = Some(self.hold.hold(self.pin, level)?);
        self.current_high = level;
        self.has_value = true;
        Ok(())
    }

    /// Terminate the held process unconditionally.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(mut held) = self.held.take() {
            held.stop()?;
        }
        Ok(())
    }
}
