//! Indicator LED: a thin on/off wrapper over an output line.

use crate::drivers::output_line::OutputLine;
use crate::error::Result;

#[derive(Debug)]
pub struct Led {
    id: String,
    line: OutputLine,
}

impl Led {
    pub fn new(id: &str, line: OutputLine) -> Self {
        Self {
            id: id.to_string(),
            line,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pin(&self) -> u8 {
        self.line.pin()
    }

    pub fn on(&mut self) -> Result<()> {
        self.line.set_high()
    }

    pub fn off(&mut self) -> Result<()> {
        self.line.set_low()
    }

    pub fn set(&mut self, on: bool) -> Result<()> {
        if on {
            self.on()
        } else {
            self.off()
        }
    }

    pub fn is_on(&self) -> bool {
        self.line.is_high()
    }

    /// Release the held process unconditionally.
    pub fn shutdown(&mut self) -> Result<()> {
        self.line.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use crate::drivers::output_line::tests::mock_line;

    use super::*;

    #[test]
    fn on_off_tracks_logical_state() {
        let (line, log) = mock_line(26, false, false);
        let mut led = Led::new("t1", line);
        led.on().unwrap();
        assert!(led.is_on());
        led.off().unwrap();
        assert!(!led.is_on());
        // start low, high, low again → three holders
        assert_eq!(log.borrow().spawned.len(), 3);
    }
}
