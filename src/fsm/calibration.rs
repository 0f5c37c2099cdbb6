//! Calibration mode: keyboard-driven layout editor.
//!
//! Edits the center icon first, then every target in declaration order.
//! Arrow keys move, rotation and scale keys adjust while held, Enter
//! commits and advances, Escape discards the current edit and bails out.
//! Physical buttons are ignored here; the projector operator works at the
//! keyboard.

use super::context::{DisplayHints, TickContext};
use super::{ModeId, ModeRequest};
use crate::error::Result;
use crate::input::Key;
use crate::layout::{LayoutItem, Transform};
use log::{debug, info};

#[derive(Debug)]
enum CalPhase {
    Editing,
    Done { until_ms: u64 },
}

#[derive(Debug)]
pub struct CalibrationMode {
    phase: CalPhase,
    /// 0 is the center icon, 1..=N the targets.
    item_index: usize,
    work: Transform,
    last_commit_ms: Option<u64>,
}

impl CalibrationMode {
    pub fn new() -> Self {
        Self {
            phase: CalPhase::Editing,
            item_index: 0,
            work: Transform {
                x: 0.0,
                y: 0.0,
                rotation_deg: 0.0,
                scale: 1.0,
            },
            last_commit_ms: None,
        }
    }

    pub fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        ctx.inventory.all_off()?;
        self.phase = CalPhase::Editing;
        self.item_index = 0;
        self.work = ctx.layout.get(LayoutItem::Center);
        self.last_commit_ms = None;
        info!("calibration: editing center icon");
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        match self.phase {
            CalPhase::Editing => {
                let item = self.current_item();
                ctx.hints = DisplayHints::Calibration { item };

                if ctx.input.key_pressed(Key::Escape) {
                    info!("calibration: cancelled, edits discarded");
                    return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
                }

                self.apply_held_keys(ctx, item);

                let debounced = self
                    .last_commit_ms
                    .is_some_and(|at| ctx.now_ms - at < ctx.config.enter_debounce_ms);
                if ctx.input.key_pressed(Key::Enter) && !debounced {
                    self.commit(ctx, item);
                }
            }
            CalPhase::Done { until_ms } => {
                ctx.hints = DisplayHints::None;
                if ctx.now_ms >= until_ms {
                    return Ok(Some(ModeRequest::Switch(ModeId::Idle)));
                }
            }
        }
        Ok(None)
    }

    fn current_item(&self) -> LayoutItem {
        if self.item_index == 0 {
            LayoutItem::Center
        } else {
            LayoutItem::Target(self.item_index - 1)
        }
    }

    /// Continuous adjustment while keys are held.
    fn apply_held_keys(&mut self, ctx: &TickContext, item: LayoutItem) {
        let cfg = ctx.config;
        let input = ctx.input;
        if input.key_down(Key::Left) {
            self.work.x -= cfg.move_step;
        }
        if input.key_down(Key::Right) {
            self.work.x += cfg.move_step;
        }
        if input.key_down(Key::Up) {
            self.work.y -= cfg.move_step;
        }
        if input.key_down(Key::Down) {
            self.work.y += cfg.move_step;
        }
        let (x, y) = ctx.layout.clamp_position(self.work.x, self.work.y);
        self.work.x = x;
        self.work.y = y;

        if matches!(item, LayoutItem::Target(_)) {
            if input.key_down(Key::Char('q')) {
                self.work.rotation_deg = crate::layout::wrap_degrees(
                    self.work.rotation_deg - cfg.rotate_step_deg,
                );
            }
            if input.key_down(Key::Char('e')) {
                self.work.rotation_deg = crate::layout::wrap_degrees(
                    self.work.rotation_deg + cfg.rotate_step_deg,
                );
            }
        }

        if input.key_down(Key::Char('+')) || input.key_down(Key::Char('=')) {
            self.work.scale += cfg.scale_step;
        }
        if input.key_down(Key::Char('-')) {
            self.work.scale -= cfg.scale_step;
        }
        let (scale_min, scale_max) = match item {
            LayoutItem::Center => (cfg.center_scale_min, cfg.center_scale_max),
            LayoutItem::Target(_) => (cfg.target_scale_min, cfg.target_scale_max),
        };
        self.work.scale = self.work.scale.clamp(scale_min, scale_max);
    }

    fn commit(&mut self, ctx: &mut TickContext, item: LayoutItem) {
        ctx.layout.set(item, self.work);
        self.last_commit_ms = Some(ctx.now_ms);
        debug!("calibration: committed {item:?}");

        if self.item_index >= ctx.layout.target_count() {
            info!("calibration: complete");
            self.phase = CalPhase::Done {
                until_ms: ctx.now_ms + ctx.config.calibration_done_hold_ms,
            };
            return;
        }
        self.item_index += 1;
        self.work = ctx.layout.get(self.current_item());
        info!("calibration: editing target {}", self.item_index);
    }
}
