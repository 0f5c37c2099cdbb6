//! Momentary button: sampled input line + debounce + edge detection.
//!
//! One `poll(now_ms)` per tick samples the line, runs the 35 ms hysteresis
//! filter and updates the edge tracker. Between polls the accessors return
//! the state of the most recent poll.

use crate::drivers::debounce::Debouncer;
use crate::drivers::edge::EdgeTracker;
use crate::drivers::input_line::InputLine;

#[derive(Debug)]
pub struct Button {
    id: String,
    line: InputLine,
    debouncer: Debouncer,
    edges: EdgeTracker,
}

impl Button {
    pub fn new(id: &str, line: InputLine, debounce_window_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            line,
            debouncer: Debouncer::new(debounce_window_ms),
            edges: EdgeTracker::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pin(&self) -> u8 {
        self.line.pin()
    }

    /// Sample, debounce and edge-track. Call exactly once per tick.
    pub fn poll(&mut self, now_ms: u64) {
        let raw = self.line.sample_is_active();
        let stable = self.debouncer.update(raw, now_ms);
        self.edges.update(stable);
    }

    pub fn is_down(&self) -> bool {
        self.debouncer.stable()
    }

    pub fn just_pressed(&self) -> bool {
        self.edges.edges().just_activated
    }

    pub fn just_released(&self) -> bool {
        self.edges.edges().just_deactivated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::command::{Bias, LineQuery};
    use crate::error::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scriptable query: returns replies from a shared queue-of-one.
    struct ScriptedQuery {
        level: Rc<RefCell<bool>>,
    }

    impl LineQuery for ScriptedQuery {
        fn sample(&self, _bias: Bias, _pin: u8) -> Result<String> {
            // Active-low wiring: pressed = electrically low.
            Ok(if *self.level.borrow() { "0" } else { "1" }.to_string())
        }
    }

    fn scripted_button(window_ms: u64) -> (Button, Rc<RefCell<bool>>) {
        let pressed = Rc::new(RefCell::new(false));
        let line = InputLine::new(
            16,
            true,
            Bias::PullUp,
            Box::new(ScriptedQuery {
                level: Rc::clone(&pressed),
            }),
        );
        (Button::new("start", line, window_ms), pressed)
    }

    #[test]
    fn press_appears_after_debounce_window() {
        let (mut btn, pressed) = scripted_button(35);
        btn.poll(0);
        assert!(!btn.is_down());

        *pressed.borrow_mut() = true;
        btn.poll(10);
        assert!(!btn.is_down()); // window running
        btn.poll(50);
        assert!(btn.is_down());
        assert!(btn.just_pressed());
        btn.poll(70);
        assert!(!btn.just_pressed()); // edge was one poll wide
    }

    #[test]
    fn release_edge_fires_once() {
        let (mut btn, pressed) = scripted_button(35);
        *pressed.borrow_mut() = true;
        btn.poll(0);
        assert!(btn.is_down()); // first sample initialises directly

        *pressed.borrow_mut() = false;
        btn.poll(10);
        btn.poll(50);
        assert!(btn.just_released());
        btn.poll(70);
        assert!(!btn.just_released());
    }
}
