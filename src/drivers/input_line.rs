//! Sampled input line with reply parsing, bias and active-low inversion.
//!
//! Every sample is a fresh external query. The tools in the field reply in
//! several vocabularies depending on version, so the parser runs a ladder:
//!
//! 1. exact `"0"` / `"1"`
//! 2. normalised `<pin>=active` / `<pin>=inactive` suffix (quotes stripped)
//! 3. `active` / `inactive` substring
//! 4. trailing-digit scan (last resort)
//!
//! Anything unparseable, and any command failure, defaults to inactive with
//! a logged warning. No retries: the next tick is a fresh attempt.

use crate::drivers::command::{Bias, LineQuery};
use log::warn;

pub struct InputLine {
    pin: u8,
    active_low: bool,
    bias: Bias,
    query: Box<dyn LineQuery>,
}

impl std::fmt::Debug for InputLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputLine")
            .field("pin", &self.pin)
            .field("active_low", &self.active_low)
            .field("bias", &self.bias)
            .finish_non_exhaustive()
    }
}

impl InputLine {
    pub fn new(pin: u8, active_low: bool, bias: Bias, query: Box<dyn LineQuery>) -> Self {
        Self {
            pin,
            active_low,
            bias,
            query,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Sample the line once and return its logical active state.
    pub fn sample_is_active(&self) -> bool {
        let raw_high = match self.query.sample(self.bias, self.pin) {
            Ok(reply) => match parse_level_reply(&reply) {
                Some(level) => level,
                None => {
                    warn!(
                        "pin {}: unparseable reply {:?}, defaulting to inactive",
                        self.pin,
                        reply.trim()
                    );
                    false
                }
            },
            Err(e) => {
                warn!("pin {}: query failed ({e}), defaulting to inactive", self.pin);
                false
            }
        };

        if self.active_low {
            !raw_high
        } else {
            raw_high
        }
    }
}

/// Parse a line-tool reply into a raw electrical level.
pub fn parse_level_reply(reply: &str) -> Option<bool> {
    let trimmed = reply.trim();

    // 1. Bare digit.
    match trimmed {
        "0" => return Some(false),
        "1" => return Some(true),
        _ => {}
    }

    // 2. Normalised "<pin>=active" / "<pin>=inactive" suffix.
    let normalised: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | ' '))
        .collect();
    if normalised.ends_with("=active") {
        return Some(true);
    }
    if normalised.ends_with("=inactive") {
        return Some(false);
    }

    // 3. Substring. "inactive" contains "active", so it is checked first.
    if normalised.contains("inactive") {
        return Some(false);
    }
    if normalised.contains("active") {
        return Some(true);
    }

    // 4. Trailing digit scan.
    match trimmed.chars().rev().find(|c| c.is_ascii_digit()) {
        Some('0') => Some(false),
        Some('1') => Some(true),
        _ => None,
    }
}
