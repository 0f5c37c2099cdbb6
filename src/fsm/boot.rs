//! Boot mode: hardware self-test.
//!
//! After a startup pause the mode sweeps every indicator with a short blink,
//! then waits for the operator to press each test button in turn. Feedback
//! while a button is held is distinct per id (start lights the two outer
//! life indicators, a target lights its own indicator) and a confirm blink
//! acknowledges each validated button. Once all buttons validate, everything
//! blinks and the mode hands over to idle.

use super::blink::{BlinkSequence, BlinkSet};
use super::context::{DisplayHints, TickContext};
use super::{ModeId, ModeRequest};
use crate::error::Result;
use log::{debug, info};

/// One indicator the sweep visits, life indicators first.
#[derive(Debug, Clone, Copy)]
enum SweepItem {
    Life(usize),
    Target(usize),
}

/// One button of the self-test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestButton {
    Start,
    Target(usize),
}

impl TestButton {
    fn feedback(self) -> BlinkSet {
        match self {
            Self::Start => BlinkSet::OuterLives,
            Self::Target(i) => BlinkSet::Target(i),
        }
    }
}

#[derive(Debug)]
enum BootPhase {
    Delay { until_ms: u64 },
    Sweep { item: usize, step: SweepStep },
    WaitButtons,
    Confirm { button: TestButton, blink: BlinkSequence },
    Done { blink: BlinkSequence },
}

#[derive(Debug)]
enum SweepStep {
    Blink(BlinkSequence),
    Gap { until_ms: u64 },
}

#[derive(Debug)]
pub struct BootMode {
    phase: BootPhase,
    start_validated: bool,
    /// Indexed like the inventory's target list; entries without a button
    /// are pre-marked validated so they never block completion.
    target_validated: Vec<bool>,
    /// Button whose held-feedback is currently shown.
    feedback: Option<TestButton>,
}

impl BootMode {
    pub fn new() -> Self {
        Self {
            phase: BootPhase::Delay { until_ms: 0 },
            start_validated: false,
            target_validated: Vec::new(),
            feedback: None,
        }
    }

    pub fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        self.phase = BootPhase::Delay {
            until_ms: ctx.now_ms + ctx.config.boot_delay_ms,
        };
        self.start_validated = !ctx.inventory.has_start_button();
        self.target_validated = ctx
            .inventory
            .targets()
            .iter()
            .map(|t| !t.has_button())
            .collect();
        self.feedback = None;
        info!("self-test: waiting {} ms before sweep", ctx.config.boot_delay_ms);
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        ctx.hints = DisplayHints::SelfTest {
            validated: self.validated_count(),
            total: self.test_button_count(),
        };

        match &mut self.phase {
            BootPhase::Delay { until_ms } => {
                if ctx.now_ms >= *until_ms {
                    debug!("self-test: sweep begins");
                    self.begin_sweep_item(ctx, 0)?;
                }
            }
            BootPhase::Sweep { item, step } => {
                let item = *item;
                match step {
                    SweepStep::Blink(seq) => {
                        if seq.tick(ctx.now_ms, ctx.inventory)? {
                            self.phase = BootPhase::Sweep {
                                item,
                                step: SweepStep::Gap {
                                    until_ms: ctx.now_ms + ctx.config.boot_sweep_gap_ms,
                                },
                            };
                        }
                    }
                    SweepStep::Gap { until_ms } => {
                        if ctx.now_ms >= *until_ms {
                            self.begin_sweep_item(ctx, item + 1)?;
                        }
                    }
                }
            }
            BootPhase::WaitButtons => self.update_wait(ctx)?,
            BootPhase::Confirm { button, blink } => {
                let button = *button;
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    if self.all_validated() {
                        info!("self-test: all buttons validated");
                        self.phase = BootPhase::Done {
                            blink: BlinkSequence::new(
                                BlinkSet::All,
                                ctx.config.boot_confirm_blinks,
                                ctx.config.boot_blink_on_ms,
                                ctx.config.boot_blink_off_ms,
                            ),
                        };
                    } else {
                        debug!("self-test: {button:?} validated");
                        self.phase = BootPhase::WaitButtons;
                    }
                }
            }
            BootPhase::Done { blink } => {
                if blink.tick(ctx.now_ms, ctx.inventory)? {
                    return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
                }
            }
        }
        Ok(None)
    }

    fn begin_sweep_item(&mut self, ctx: &mut TickContext, index: usize) -> Result<()> {
        match self.sweep_item(ctx, index) {
            Some(item) => {
                let set = match item {
                    SweepItem::Life(i) => BlinkSet::Life(i),
                    SweepItem::Target(i) => BlinkSet::Target(i),
                };
                self.phase = BootPhase::Sweep {
                    item: index,
                    step: SweepStep::Blink(BlinkSequence::new(
                        set,
                        ctx.config.boot_sweep_blinks,
                        ctx.config.boot_blink_on_ms,
                        ctx.config.boot_blink_off_ms,
                    )),
                };
                Ok(())
            }
            None => {
                // A board with no test buttons has nothing left to wait for.
                if self.all_validated() {
                    info!("self-test: no buttons to validate");
                    self.phase = BootPhase::Done {
                        blink: BlinkSequence::new(
                            BlinkSet::All,
                            ctx.config.boot_confirm_blinks,
                            ctx.config.boot_blink_on_ms,
                            ctx.config.boot_blink_off_ms,
                        ),
                    };
                } else {
                    self.phase = BootPhase::WaitButtons;
                }
                Ok(())
            }
        }
    }

    fn sweep_item(&self, ctx: &TickContext, index: usize) -> Option<SweepItem> {
        let lives = ctx.inventory.life_count();
        if index < lives {
            Some(SweepItem::Life(index))
        } else if index - lives < ctx.inventory.target_count() {
            Some(SweepItem::Target(index - lives))
        } else {
            None
        }
    }

    fn update_wait(&mut self, ctx: &mut TickContext) -> Result<()> {
        let mut down: Vec<TestButton> = Vec::new();
        if ctx.input.start.down {
            down.push(TestButton::Start);
        }
        for i in ctx.input.targets_down() {
            down.push(TestButton::Target(i));
        }

        // Exclusivity: feedback only while exactly one test button is down.
        if down.len() != 1 {
            self.clear_feedback(ctx)?;
            return Ok(());
        }
        let button = down[0];
        if self.is_validated(button) {
            self.clear_feedback(ctx)?;
            return Ok(());
        }
        if self.feedback != Some(button) {
            self.clear_feedback(ctx)?;
            self.show_feedback(ctx, button)?;
        }
        let pressed = match button {
            TestButton::Start => ctx.input.start.just_pressed,
            TestButton::Target(i) => ctx.input.targets.get(i).is_some_and(|b| b.just_pressed),
        };
        if pressed {
            self.mark_validated(button);
            self.feedback = None;
            self.phase = BootPhase::Confirm {
                button,
                blink: BlinkSequence::new(
                    button.feedback(),
                    ctx.config.boot_confirm_blinks,
                    ctx.config.boot_blink_on_ms,
                    ctx.config.boot_blink_off_ms,
                ),
            };
        }
        Ok(())
    }

    fn show_feedback(&mut self, ctx: &mut TickContext, button: TestButton) -> Result<()> {
        match button {
            TestButton::Start => ctx.inventory.set_outer_life_leds(true)?,
            TestButton::Target(i) => ctx.inventory.set_target_led(i, true)?,
        }
        self.feedback = Some(button);
        Ok(())
    }

    fn clear_feedback(&mut self, ctx: &mut TickContext) -> Result<()> {
        if let Some(button) = self.feedback.take() {
            match button {
                TestButton::Start => ctx.inventory.set_outer_life_leds(false)?,
                TestButton::Target(i) => ctx.inventory.set_target_led(i, false)?,
            }
        }
        Ok(())
    }

    fn is_validated(&self, button: TestButton) -> bool {
        match button {
            TestButton::Start => self.start_validated,
            TestButton::Target(i) => self.target_validated.get(i).copied().unwrap_or(true),
        }
    }

    fn mark_validated(&mut self, button: TestButton) {
        match button {
            TestButton::Start => self.start_validated = true,
            TestButton::Target(i) => {
                if let Some(slot) = self.target_validated.get_mut(i) {
                    *slot = true;
                }
            }
        }
    }

    fn all_validated(&self) -> bool {
        self.start_validated && self.target_validated.iter().all(|v| *v)
    }

    fn validated_count(&self) -> usize {
        usize::from(self.start_validated)
            + self.target_validated.iter().filter(|v| **v).count()
    }

    fn test_button_count(&self) -> usize {
        1 + self.target_validated.len()
    }
}
