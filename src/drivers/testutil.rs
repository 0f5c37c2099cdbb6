//! In-memory line backends for tests. No process is ever spawned.

use crate::drivers::command::{Bias, HeldLevel, LineHold, LineQuery};
use crate::drivers::registry::PinRegistry;
use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared pressed-state map keyed by BCM pin, mutated by tests to simulate
/// button activity between ticks.
pub type PressedMap = Rc<RefCell<HashMap<u8, bool>>>;

/// Query fake wired for active-low inputs: pressed pins read electrically
/// low ("0"), everything else high ("1").
pub struct MapQuery {
    pressed: PressedMap,
}

impl LineQuery for MapQuery {
    fn sample(&self, _bias: Bias, pin: u8) -> Result<String> {
        let pressed = self.pressed.borrow().get(&pin).copied().unwrap_or(false);
        Ok(if pressed { "0" } else { "1" }.to_string())
    }
}

/// Hold fake whose handles track nothing; logical LED state is observed
/// through `OutputLine::is_high`.
pub struct NullHold;

struct NullHandle;

impl HeldLevel for NullHandle {
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

impl LineHold for NullHold {
    fn hold(&self, _pin: u8, _high: bool) -> Result<Box<dyn HeldLevel>> {
        Ok(Box::new(NullHandle))
    }
}

/// A registry whose drivers run entirely in memory, plus the pressed-state
/// map for scripting inputs.
pub fn mock_registry() -> (PinRegistry, PressedMap) {
    let pressed: PressedMap = Rc::new(RefCell::new(HashMap::new()));
    let for_query = Rc::clone(&pressed);
    let registry = PinRegistry::with_backends(
        Box::new(move || {
            Box::new(MapQuery {
                pressed: Rc::clone(&for_query),
            })
        }),
        Box::new(|| Box::new(NullHold)),
    );
    (registry, pressed)
}
