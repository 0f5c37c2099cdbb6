//! Time-windowed hysteresis filter for noisy boolean inputs.
//!
//! The stable output follows the raw input only after the raw value has
//! held unchanged for the full window. Pure function of `(raw, now_ms)` and
//! prior state; no allocation, safe at any tick rate.

#[derive(Debug)]
pub struct Debouncer {
    window_ms: u64,
    stable: bool,
    last_raw: bool,
    last_change_ms: u64,
    has_sample: bool,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            stable: false,
            last_raw: false,
            last_change_ms: 0,
            has_sample: false,
        }
    }

    /// Feed one raw sample, returns the stable value.
    ///
    /// The first sample initialises the filter directly: a device that is
    /// already pressed at startup reads pressed immediately.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> bool {
        if !self.has_sample {
            self.has_sample = true;
            self.stable = raw;
            self.last_raw = raw;
            self.last_change_ms = now_ms;
            return self.stable;
        }

        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change_ms = now_ms;
        }

        if raw != self.stable && now_ms.saturating_sub(self.last_change_ms) >= self.window_ms {
            self.stable = raw;
        }

        self.stable
    }

    pub fn stable(&self) -> bool {
        self.stable
    }
}
