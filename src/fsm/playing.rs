//! Playing mode: the adaptive reaction game.
//!
//! Wait, Show, Result, looping. Difficulty ramps per level by alternately
//! shrinking the hit window and the result display duration; perfect levels
//! build a streak that restores a life at three in a row. Running out of
//! lives blinks everything and drops back to idle.

use super::blink::{BlinkSequence, BlinkSet};
use super::context::{DisplayHints, Outcome, TickContext};
use super::{ModeId, ModeRequest};
use crate::error::Result;
use log::{debug, info};

const GAME_OVER_BLINKS: u32 = 2;
const BLINK_ON_MS: u64 = 150;
const BLINK_OFF_MS: u64 = 100;

#[derive(Debug)]
enum PlayPhase {
    Wait { until_ms: u64 },
    Show { target: usize, deadline_ms: u64 },
    Result { until_ms: u64, outcome: Outcome },
    LevelUp { blink: BlinkSequence },
    GameOver { blink: BlinkSequence },
}

#[derive(Debug)]
pub struct PlayingMode {
    phase: PlayPhase,
    level: u32,
    lives: u8,
    hit_window_ms: u64,
    show_duration_ms: u64,
    correct_in_level: u32,
    attempts_in_level: u32,
    max_attempts: u32,
    random_waits_used: u32,
    perfect_streak: u32,
    /// Which knob the next level-up shrinks; starts with the hit window.
    shrink_hit_window_next: bool,
}

impl PlayingMode {
    pub fn new() -> Self {
        Self {
            phase: PlayPhase::Wait { until_ms: 0 },
            level: 1,
            lives: 0,
            hit_window_ms: 0,
            show_duration_ms: 0,
            correct_in_level: 0,
            attempts_in_level: 0,
            max_attempts: 0,
            random_waits_used: 0,
            perfect_streak: 0,
            shrink_hit_window_next: true,
        }
    }

    pub fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        let cfg = ctx.config;
        self.level = 1;
        self.lives = cfg.starting_lives;
        self.hit_window_ms = cfg.initial_hit_window_ms;
        self.show_duration_ms = cfg.initial_show_duration_ms;
        self.correct_in_level = 0;
        self.attempts_in_level = 0;
        self.max_attempts = Self::attempt_budget(cfg.correct_per_level, self.lives);
        self.random_waits_used = 0;
        self.perfect_streak = 0;
        self.shrink_hit_window_next = true;
        ctx.inventory.targets_off()?;
        ctx.inventory.show_lives(self.lives)?;
        self.begin_wait(ctx);
        info!("game: started with {} lives", self.lives);
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        match &mut self.phase {
            PlayPhase::Wait { until_ms } => {
                ctx.hints = DisplayHints::Playing {
                    cue_visible: false,
                    outcome: None,
                };
                if ctx.now_ms >= *until_ms {
                    let target = ctx.rng.gen_index(ctx.inventory.target_count());
                    ctx.inventory.set_target_led(target, true)?;
                    self.phase = PlayPhase::Show {
                        target,
                        deadline_ms: ctx.now_ms + self.hit_window_ms,
                    };
                }
            }
            PlayPhase::Show { target, deadline_ms } => {
                let target = *target;
                let deadline = *deadline_ms;
                ctx.hints = DisplayHints::Playing {
                    cue_visible: true,
                    outcome: None,
                };
                if let Some(pressed) = ctx.input.just_pressed_target() {
                    if pressed == target {
                        self.settle_trial(ctx, target, Outcome::Success)?;
                    } else {
                        self.settle_trial(ctx, target, Outcome::Failure)?;
                    }
                } else if ctx.now_ms >= deadline {
                    self.settle_trial(ctx, target, Outcome::Failure)?;
                }
            }
            PlayPhase::Result { until_ms, outcome } => {
                ctx.hints = DisplayHints::Playing {
                    cue_visible: false,
                    outcome: Some(*outcome),
                };
                if ctx.now_ms >= *until_ms {
                    self.settle_result(ctx)?;
                }
            }
            PlayPhase::LevelUp { blink } => {
                ctx.hints = DisplayHints::Playing {
                    cue_visible: false,
                    outcome: None,
                };
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    ctx.inventory.show_lives(self.lives)?;
                    self.begin_wait(ctx);
                }
            }
            PlayPhase::GameOver { blink } => {
                ctx.hints = DisplayHints::Playing {
                    cue_visible: false,
                    outcome: Some(Outcome::Failure),
                };
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
                }
            }
        }
        Ok(None)
    }

    /// Close out a Show phase with the given outcome and start the result
    /// display.
    fn settle_trial(&mut self, ctx: &mut TickContext, target: usize, outcome: Outcome) -> Result<()> {
        ctx.inventory.set_target_led(target, false)?;
        self.attempts_in_level += 1;
        match outcome {
            Outcome::Success => {
                self.correct_in_level += 1;
                debug!(
                    "game: hit ({}/{} this level)",
                    self.correct_in_level, ctx.config.correct_per_level
                );
            }
            Outcome::Failure => {
                self.lives = self.lives.saturating_sub(1);
                ctx.inventory.show_lives(self.lives)?;
                debug!("game: miss, {} lives left", self.lives);
            }
        }
        self.phase = PlayPhase::Result {
            until_ms: ctx.now_ms + self.show_duration_ms,
            outcome,
        };
        Ok(())
    }

    /// Result display over: game over, level complete or next trial.
    fn settle_result(&mut self, ctx: &mut TickContext) -> Result<()> {
        let cfg = ctx.config;
        if self.lives == 0 {
            info!("game: over at level {}", self.level);
            self.phase = PlayPhase::GameOver {
                blink: BlinkSequence::new(BlinkSet::All, GAME_OVER_BLINKS, BLINK_ON_MS, BLINK_OFF_MS),
            };
            return Ok(());
        }
        if self.correct_in_level >= cfg.correct_per_level
            || self.attempts_in_level >= self.max_attempts
        {
            self.level_up(cfg);
            info!(
                "game: level {} (hit window {} ms, show {} ms, {} lives)",
                self.level, self.hit_window_ms, self.show_duration_ms, self.lives
            );
            self.phase = PlayPhase::LevelUp {
                blink: BlinkSequence::new(BlinkSet::All, self.level, BLINK_ON_MS, BLINK_OFF_MS),
            };
            return Ok(());
        }
        self.begin_wait(ctx);
        Ok(())
    }

    fn level_up(&mut self, cfg: &crate::config::SystemConfig) {
        let perfect = self.correct_in_level == cfg.correct_per_level;
        self.level += 1;
        if self.shrink_hit_window_next {
            self.hit_window_ms = self
                .hit_window_ms
                .saturating_sub(cfg.hit_window_step_ms)
                .max(cfg.min_hit_window_ms);
        } else {
            self.show_duration_ms = self
                .show_duration_ms
                .saturating_sub(cfg.show_duration_step_ms)
                .max(cfg.min_show_duration_ms);
        }
        self.shrink_hit_window_next = !self.shrink_hit_window_next;

        if perfect {
            self.perfect_streak += 1;
            if self.perfect_streak == 3 {
                self.lives = (self.lives + 1).min(cfg.starting_lives);
                self.perfect_streak = 0;
                debug!("game: perfect streak, life restored ({})", self.lives);
            }
        } else {
            self.perfect_streak = 0;
        }

        self.correct_in_level = 0;
        self.attempts_in_level = 0;
        self.random_waits_used = 0;
        self.max_attempts = Self::attempt_budget(cfg.correct_per_level, self.lives);
    }

    fn begin_wait(&mut self, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let delay = if self.random_waits_used < cfg.random_waits_per_level {
            self.random_waits_used += 1;
            ctx.rng.gen_range(cfg.wait_min_ms, cfg.wait_max_ms)
        } else {
            0
        };
        self.phase = PlayPhase::Wait {
            until_ms: ctx.now_ms + delay,
        };
    }

    fn attempt_budget(correct_per_level: u32, lives: u8) -> u32 {
        correct_per_level + u32::from(lives.saturating_sub(1))
    }
}
