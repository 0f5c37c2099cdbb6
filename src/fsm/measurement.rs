//! Measurement mode: the fixed diagnostic protocol.
//!
//! Three Enter-gated metadata steps (subject id, condition, moment), each
//! indicated by a distinct life LED, then a fixed number of reaction trials
//! against randomly chosen targets. A double-press of the start button at
//! any point aborts the run and discards the open record.

use super::blink::{BlinkSequence, BlinkSet};
use super::context::{DisplayHints, TickContext};
use super::{ModeId, ModeRequest};
use crate::diagnostics::{Condition, Moment, ReactionRecord};
use crate::error::Result;
use crate::input::Key;
use log::{debug, info, warn};

const PROTOCOL_BLINKS: u32 = 2;
const BLINK_ON_MS: u64 = 150;
const BLINK_OFF_MS: u64 = 100;

#[derive(Debug)]
enum MeasPhase {
    /// Metadata entry, `step` in 1..=3.
    Metadata { step: u8 },
    StartBlink { blink: BlinkSequence },
    TrialShow { trial: usize, target: usize, lit_at_ms: u64 },
    TrialGap { trial_done: usize, until_ms: u64 },
    DoneBlink { blink: BlinkSequence },
}

#[derive(Debug)]
pub struct MeasurementMode {
    phase: MeasPhase,
    subject_buffer: String,
    condition: Condition,
    moment: Moment,
    record: Option<ReactionRecord>,
    last_start_press_ms: Option<u64>,
}

impl MeasurementMode {
    pub fn new() -> Self {
        Self {
            phase: MeasPhase::Metadata { step: 1 },
            subject_buffer: String::new(),
            condition: Condition::Real,
            moment: Moment::Before,
            record: None,
            last_start_press_ms: None,
        }
    }

    pub fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        self.phase = MeasPhase::Metadata { step: 1 };
        self.subject_buffer.clear();
        self.condition = Condition::Real;
        self.moment = Moment::Before;
        self.record = None;
        self.last_start_press_ms = None;
        ctx.inventory.all_off()?;
        self.show_step_indicator(ctx, 1)?;
        info!("measurement: enter subject id");
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        if self.abort_requested(ctx) {
            info!("measurement: double-press abort, record discarded");
            self.record = None;
            return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
        }

        match &mut self.phase {
            MeasPhase::Metadata { step } => {
                let step = *step;
                ctx.hints = DisplayHints::Measurement {
                    metadata_step: Some(step),
                    trial: None,
                };
                self.update_metadata(ctx, step)?;
            }
            MeasPhase::StartBlink { blink } => {
                ctx.hints = DisplayHints::Measurement {
                    metadata_step: None,
                    trial: None,
                };
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    self.begin_trial(ctx, 0)?;
                }
            }
            MeasPhase::TrialShow { trial, target, lit_at_ms } => {
                let (trial, target, lit_at) = (*trial, *target, *lit_at_ms);
                ctx.hints = DisplayHints::Measurement {
                    metadata_step: None,
                    trial: Some(trial + 1),
                };
                if ctx.input.just_pressed_target() == Some(target) {
                    let elapsed = ctx.now_ms - lit_at;
                    if let Some(record) = self.record.as_mut() {
                        record.set_trial(trial, elapsed);
                    }
                    ctx.inventory.set_target_led(target, false)?;
                    debug!("measurement: trial {} reacted in {elapsed} ms", trial + 1);
                    if trial + 1 >= ctx.config.measurement_trials {
                        self.finish();
                    } else {
                        self.phase = MeasPhase::TrialGap {
                            trial_done: trial,
                            until_ms: ctx.now_ms + ctx.config.inter_trial_gap_ms,
                        };
                    }
                }
            }
            MeasPhase::TrialGap { trial_done, until_ms } => {
                let next = *trial_done + 1;
                ctx.hints = DisplayHints::Measurement {
                    metadata_step: None,
                    trial: Some(next),
                };
                if ctx.now_ms >= *until_ms {
                    self.begin_trial(ctx, next)?;
                }
            }
            MeasPhase::DoneBlink { blink } => {
                ctx.hints = DisplayHints::Measurement {
                    metadata_step: None,
                    trial: None,
                };
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    if let Some(record) = self.record.take() {
                        ctx.diagnostics.append(record);
                    }
                    return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
                }
            }
        }
        Ok(None)
    }

    /// Two start-button presses within the abort window.
    fn abort_requested(&mut self, ctx: &TickContext) -> bool {
        if !ctx.input.start.just_pressed {
            return false;
        }
        let previous = self.last_start_press_ms.replace(ctx.now_ms);
        matches!(previous, Some(at) if ctx.now_ms - at <= ctx.config.abort_double_press_ms)
    }

    fn update_metadata(&mut self, ctx: &mut TickContext, step: u8) -> Result<()> {
        for key in &ctx.input.keys_pressed {
            match (step, *key) {
                (1, k) if k.digit().is_some() => {
                    if let Key::Char(c) = k {
                        self.subject_buffer.push(c);
                    }
                }
                (1, Key::Backspace) => self.subject_buffer.clear(),
                (2, Key::Char('g')) => self.condition = Condition::Game,
                (2, Key::Char('r')) => self.condition = Condition::Real,
                (3, Key::Char('b')) => self.moment = Moment::Before,
                (3, Key::Char('a')) => self.moment = Moment::After,
                _ => {}
            }
        }

        if ctx.input.key_pressed(Key::Enter) {
            match step {
                1 => match self.subject_buffer.parse::<i64>() {
                    Ok(_) => self.advance_step(ctx, 2)?,
                    Err(_) => {
                        debug!("measurement: subject id \"{}\" rejected", self.subject_buffer);
                    }
                },
                2 => self.advance_step(ctx, 3)?,
                _ => self.finalize_metadata(ctx)?,
            }
        }
        Ok(())
    }

    fn advance_step(&mut self, ctx: &mut TickContext, step: u8) -> Result<()> {
        self.phase = MeasPhase::Metadata { step };
        self.show_step_indicator(ctx, step)?;
        debug!("measurement: metadata step {step}");
        Ok(())
    }

    /// Light the life LED matching the metadata step, others off.
    fn show_step_indicator(&mut self, ctx: &mut TickContext, step: u8) -> Result<()> {
        for i in 0..ctx.inventory.life_count() {
            ctx.inventory.set_life_led(i, i + 1 == usize::from(step))?;
        }
        Ok(())
    }

    fn finalize_metadata(&mut self, ctx: &mut TickContext) -> Result<()> {
        let subject_id = match self.subject_buffer.parse::<i64>() {
            Ok(id) => id,
            Err(e) => {
                // Step 1 only admits digits, so this should be unreachable.
                warn!("measurement: subject id unparseable ({e}), using 0");
                0
            }
        };
        self.record = Some(ReactionRecord::open(subject_id, self.moment, self.condition));
        ctx.inventory.all_off()?;
        info!(
            "measurement: subject {subject_id}, {}, {}: starting trials",
            self.condition.as_str(),
            self.moment.as_str()
        );
        self.phase = MeasPhase::StartBlink {
            blink: BlinkSequence::new(BlinkSet::All, PROTOCOL_BLINKS, BLINK_ON_MS, BLINK_OFF_MS),
        };
        Ok(())
    }

    fn begin_trial(&mut self, ctx: &mut TickContext, trial: usize) -> Result<()> {
        let target = ctx.rng.gen_index(ctx.inventory.target_count());
        ctx.inventory.set_target_led(target, true)?;
        self.phase = MeasPhase::TrialShow {
            trial,
            target,
            lit_at_ms: ctx.now_ms,
        };
        Ok(())
    }

    fn finish(&mut self) {
        info!("measurement: all trials complete");
        self.phase = MeasPhase::DoneBlink {
            blink: BlinkSequence::new(BlinkSet::All, PROTOCOL_BLINKS, BLINK_ON_MS, BLINK_OFF_MS),
        };
    }
}
