//! Exclusive BCM pin ownership and driver factories.
//!
//! Every driver in the system acquires its pin through this registry, the
//! one place claims are recorded. A duplicate claim is fatal at construction
//! time; running with ambiguous pin ownership is never acceptable. Claims
//! are permanent for the process lifetime, never released individually.
//!
//! The query/hold backends are injected as factories so the whole device
//! graph can be built against in-memory fakes in tests.

use crate::config::SystemConfig;
use crate::drivers::command::{Bias, HoldTool, LineHold, LineQuery, QueryTool};
use crate::drivers::input_line::InputLine;
use crate::drivers::output_line::OutputLine;
use crate::error::{PinError, Result};
use log::debug;
use std::collections::HashMap;

pub type QueryFactory = Box<dyn Fn() -> Box<dyn LineQuery>>;
pub type HoldFactory = Box<dyn Fn() -> Box<dyn LineHold>>;

pub struct PinRegistry {
    claims: HashMap<u8, String>,
    query_factory: QueryFactory,
    hold_factory: HoldFactory,
}

impl PinRegistry {
    /// Registry backed by the external line tools from the configuration.
    pub fn new(config: &SystemConfig) -> Self {
        let (query_program, chip) = (config.query_program.clone(), config.gpio_chip.clone());
        let (hold_program, hold_chip) = (config.hold_program.clone(), config.gpio_chip.clone());
        Self::with_backends(
            Box::new(move || Box::new(QueryTool::new(&query_program, &chip))),
            Box::new(move || Box::new(HoldTool::new(&hold_program, &hold_chip))),
        )
    }

    /// Registry with injected backends (tests, alternative write paths).
    pub fn with_backends(query_factory: QueryFactory, hold_factory: HoldFactory) -> Self {
        Self {
            claims: HashMap::new(),
            query_factory,
            hold_factory,
        }
    }

    /// Record an exclusive claim, naming both parties on conflict.
    pub fn claim(&mut self, pin: u8, owner: &str) -> Result<()> {
        if let Some(first) = self.claims.get(&pin) {
            return Err(PinError::Conflict {
                pin,
                first_owner: first.clone(),
                second_owner: owner.to_string(),
            }
            .into());
        }
        debug!("pin {pin} claimed by '{owner}'");
        self.claims.insert(pin, owner.to_string());
        Ok(())
    }

    /// Claim then construct an output driver (off at start, non-inverted).
    pub fn create_output(&mut self, pin: u8, owner: &str) -> Result<OutputLine> {
        self.claim(pin, owner)?;
        OutputLine::new(pin, false, false, (self.hold_factory)())
    }

    /// Claim then construct an input driver (active-low with pull-up, the
    /// wiring convention for every momentary sensor on the board).
    pub fn create_input(&mut self, pin: u8, owner: &str) -> Result<InputLine> {
        self.claim(pin, owner)?;
        Ok(InputLine::new(pin, true, Bias::PullUp, (self.query_factory)()))
    }

    pub fn claimed_count(&self) -> usize {
        self.claims.len()
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        self.claims.contains_key(&pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::testutil;

    #[test]
    fn double_claim_is_a_conflict() {
        let mut reg = testutil::mock_registry().0;
        reg.claim(16, "t1-button").unwrap();
        let err = reg.claim(16, "t2-button").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("t1-button") && msg.contains("t2-button"));
        // The first claim is unaffected.
        assert!(reg.is_claimed(16));
        assert_eq!(reg.claimed_count(), 1);
    }

    #[test]
    fn distinct_pins_coexist() {
        let mut reg = testutil::mock_registry().0;
        reg.claim(5, "life3").unwrap();
        reg.claim(6, "life2").unwrap();
        reg.claim(13, "life1").unwrap();
        assert_eq!(reg.claimed_count(), 3);
    }

    #[test]
    fn factory_failure_does_not_leak_the_claim_slot() {
        // A claim made through a factory is permanent even if later rows
        // conflict; the registry never rolls back.
        let mut reg = testutil::mock_registry().0;
        let _led = reg.create_output(26, "t1").unwrap();
        assert!(reg.create_input(26, "t1-button").is_err());
        assert_eq!(reg.claimed_count(), 1);
    }
}
