//! Terminal keyboard adapter.
//!
//! Wraps crossterm's non-blocking event poll and turns terminal key events
//! into the snapshot's edge/held vectors. Running headless (no TTY) is a
//! supported deployment; the adapter then degrades to an inert source and
//! the calibration editor simply has no keys to read.

use crate::input::Key;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;
use log::{debug, warn};
use std::time::Duration;

/// How long the initial press counts as held. Terminals wait around half a
/// second before the first auto-repeat, so the press must bridge that gap
/// or a held key flickers out of `keys_down`.
const INITIAL_REPEAT_GRACE_MS: u64 = 600;
/// Retention between subsequent repeat events; repeats arrive every few
/// tens of ms, so silence this long means the key was let go.
const REPEAT_RETENTION_MS: u64 = 150;

pub struct KeyboardAdapter {
    active: bool,
    /// Keys and the time until which each still counts as held.
    held: Vec<(Key, u64)>,
}

impl KeyboardAdapter {
    /// Put the terminal in raw mode so key events arrive unbuffered. A
    /// failure (no TTY, e.g. run from a service unit) leaves the adapter
    /// inert.
    pub fn new() -> Self {
        match terminal::enable_raw_mode() {
            Ok(()) => Self {
                active: true,
                held: Vec::new(),
            },
            Err(e) => {
                warn!("no terminal for keyboard input ({e}), calibration keys disabled");
                Self {
                    active: false,
                    held: Vec::new(),
                }
            }
        }
    }

    /// Drain pending terminal events. Returns the press edges of this tick;
    /// `held_keys` afterwards reflects keys still considered down.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Key> {
        let mut pressed = Vec::new();
        if !self.active {
            return pressed;
        }
        while matches!(event::poll(Duration::ZERO), Ok(true)) {
            match event::read() {
                Ok(Event::Key(key_event)) => {
                    if let Some(key) = decode(&key_event) {
                        match key_event.kind {
                            KeyEventKind::Press => {
                                if !self.is_held(key) {
                                    pressed.push(key);
                                }
                                self.note_press(key, now_ms);
                            }
                            KeyEventKind::Repeat => self.note_repeat(key, now_ms),
                            KeyEventKind::Release => self.release(key),
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("keyboard read failed: {e}");
                    break;
                }
            }
        }
        self.prune(now_ms);
        pressed
    }

    pub fn held_keys(&self) -> Vec<Key> {
        self.held.iter().map(|(k, _)| *k).collect()
    }

    fn is_held(&self, key: Key) -> bool {
        self.held.iter().any(|(k, _)| *k == key)
    }

    fn note_press(&mut self, key: Key, now_ms: u64) {
        self.hold(key, now_ms + INITIAL_REPEAT_GRACE_MS);
    }

    fn note_repeat(&mut self, key: Key, now_ms: u64) {
        self.hold(key, now_ms + REPEAT_RETENTION_MS);
    }

    fn hold(&mut self, key: Key, until_ms: u64) {
        match self.held.iter_mut().find(|(k, _)| *k == key) {
            Some((_, until)) => *until = until_ms,
            None => self.held.push((key, until_ms)),
        }
    }

    fn prune(&mut self, now_ms: u64) {
        self.held.retain(|(_, until)| now_ms <= *until);
    }

    fn release(&mut self, key: Key) {
        self.held.retain(|(k, _)| *k != key);
    }
}

impl Drop for KeyboardAdapter {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = terminal::disable_raw_mode() {
                warn!("failed to restore terminal mode: {e}");
            }
        }
    }
}


fn decode(event: &KeyEvent) -> Option<Key> {
    match event.code {
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace | KeyCode::Delete => Some(Key::Backspace),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}
