//! System configuration parameters.
//!
//! All tunable parameters for the installation: device timing, gesture
//! windows, game pacing, measurement protocol and calibration bounds.
//! Values can be overridden via a JSON file on disk; a missing or corrupt
//! file falls back to defaults with a warning, never a crash.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Tick loop ---
    /// Cooperative tick interval (milliseconds).
    pub tick_interval_ms: u64,

    // --- Device layer ---
    /// Debounce window for every button (milliseconds).
    pub debounce_window_ms: u64,
    /// External program queried for input levels (one shot per sample).
    pub query_program: String,
    /// External program held alive per asserted output level.
    pub hold_program: String,
    /// GPIO chip label passed to both external tools.
    pub gpio_chip: String,

    // --- Idle gesture recognizer ---
    /// Hold duration that fires the shutdown path (milliseconds).
    pub long_press_ms: u64,
    /// Multi-click pending window (milliseconds).
    pub multi_click_window_ms: u64,
    /// Releases shorter than this never register a click (milliseconds).
    pub click_bounce_floor_ms: u64,

    // --- Boot self-test ---
    /// Pause before the indicator sweep begins (milliseconds).
    pub boot_delay_ms: u64,
    /// Blinks per indicator during the sweep.
    pub boot_sweep_blinks: u32,
    /// Sweep blink on / off durations (milliseconds).
    pub boot_blink_on_ms: u64,
    pub boot_blink_off_ms: u64,
    /// Gap between indicators during the sweep (milliseconds).
    pub boot_sweep_gap_ms: u64,
    /// Blinks of the validated feedback in the confirm sub-loop.
    pub boot_confirm_blinks: u32,

    // --- Playing (adaptive reaction game) ---
    /// Starting lives (also the hard cap when streaks restore one).
    pub starting_lives: u8,
    /// Initial window to hit a lit target (milliseconds).
    pub initial_hit_window_ms: u64,
    /// Lower bound the hit window shrinks towards.
    pub min_hit_window_ms: u64,
    /// Per-level-up hit window reduction.
    pub hit_window_step_ms: u64,
    /// Initial result display duration (milliseconds).
    pub initial_show_duration_ms: u64,
    /// Lower bound the show duration shrinks towards.
    pub min_show_duration_ms: u64,
    /// Per-level-up show duration reduction.
    pub show_duration_step_ms: u64,
    /// Random pre-cue wait bounds (milliseconds); only the first
    /// `random_waits_per_level` waits of a level draw from this range.
    pub wait_min_ms: u64,
    pub wait_max_ms: u64,
    /// Random waits allowed per level before the delay drops to zero.
    pub random_waits_per_level: u32,
    /// Correct presses that complete a level.
    pub correct_per_level: u32,

    // --- Measurement protocol ---
    /// Number of reaction trials per record.
    pub measurement_trials: usize,
    /// Pause between trials (milliseconds).
    pub inter_trial_gap_ms: u64,
    /// Start-button double-press abort window (milliseconds).
    pub abort_double_press_ms: u64,
    /// Diagnostic export destination.
    pub export_path: String,

    // --- Calibration editor ---
    /// Canvas dimensions the projections are clamped to.
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Per-tick adjustment steps while a key is held.
    pub move_step: f32,
    pub rotate_step_deg: f32,
    pub scale_step: f32,
    /// Scale bounds (the center entry uses the narrower pair).
    pub target_scale_min: f32,
    pub target_scale_max: f32,
    pub center_scale_min: f32,
    pub center_scale_max: f32,
    /// Frame window over which Enter is debounced to avoid double-commit
    /// (milliseconds).
    pub enter_debounce_ms: u64,
    /// How long the completion state holds before returning to idle.
    pub calibration_done_hold_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Tick loop
            tick_interval_ms: 20, // 50 Hz

            // Device layer
            debounce_window_ms: 35,
            query_program: "gpioget".into(),
            hold_program: "gpioset".into(),
            gpio_chip: "gpiochip0".into(),

            // Idle gestures
            long_press_ms: 3000,
            multi_click_window_ms: 500,
            click_bounce_floor_ms: 30,

            // Boot self-test
            boot_delay_ms: 1000,
            boot_sweep_blinks: 2,
            boot_blink_on_ms: 150,
            boot_blink_off_ms: 100,
            boot_sweep_gap_ms: 200,
            boot_confirm_blinks: 3,

            // Playing
            starting_lives: 3,
            initial_hit_window_ms: 1500,
            min_hit_window_ms: 300,
            hit_window_step_ms: 200,
            initial_show_duration_ms: 1000,
            min_show_duration_ms: 200,
            show_duration_step_ms: 100,
            wait_min_ms: 500,
            wait_max_ms: 3500,
            random_waits_per_level: 2,
            correct_per_level: 6,

            // Measurement
            measurement_trials: 10,
            inter_trial_gap_ms: 500,
            abort_double_press_ms: 500,
            export_path: "reaction_log.csv".into(),

            // Calibration
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            move_step: 4.0,
            rotate_step_deg: 2.0,
            scale_step: 0.02,
            target_scale_min: 0.2,
            target_scale_max: 3.0,
            center_scale_min: 0.5,
            center_scale_max: 2.0,
            enter_debounce_ms: 250,
            calibration_done_hold_ms: 1500,
        }
    }
}

impl SystemConfig {
    /// Load configuration from a JSON file, falling back to defaults on any
    /// failure. A controller that refuses to boot over a bad config file is
    /// worse than one running defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("config parse failed ({e}), using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(), // first run, no file yet
        }
    }

    /// Persist the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.tick_interval_ms > 0);
        assert!(c.debounce_window_ms > 0);
        assert!(c.long_press_ms > c.multi_click_window_ms);
        assert!(c.initial_hit_window_ms > c.min_hit_window_ms);
        assert!(c.initial_show_duration_ms > c.min_show_duration_ms);
        assert!(c.wait_max_ms > c.wait_min_ms);
        assert!(c.target_scale_max > c.target_scale_min);
        assert!(c.center_scale_max > c.center_scale_min);
        assert_eq!(c.measurement_trials, 10);
    }

    #[test]
    fn shrink_floors_are_reachable() {
        let c = SystemConfig::default();
        // The step must be able to reach the floor without under-shooting to zero.
        assert!(c.min_hit_window_ms >= c.hit_window_step_ms);
        assert!(c.min_show_duration_ms >= c.show_duration_step_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.debounce_window_ms, c2.debounce_window_ms);
        assert_eq!(c.query_program, c2.query_program);
        assert_eq!(c.initial_hit_window_ms, c2.initial_hit_window_ms);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let c: SystemConfig = serde_json::from_str(r#"{"long_press_ms": 4000}"#).unwrap();
        assert_eq!(c.long_press_ms, 4000);
        assert_eq!(c.debounce_window_ms, SystemConfig::default().debounce_window_ms);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let c = SystemConfig::load_or_default(Path::new("/nonexistent/stomplight.json"));
        assert_eq!(c.multi_click_window_ms, 500);
    }
}
