//! Idle mode: start-button gesture recognizer.
//!
//! Counts short clicks inside a pending window and dispatches a mode by
//! count once the window lapses without another press. Holding the button
//! past the long-press threshold requests shutdown instead, and the
//! eventual release of that hold never registers as a click.

use super::context::{DisplayHints, TickContext};
use super::{ModeId, ModeRequest};
use crate::error::Result;
use log::{debug, info, warn};

#[derive(Debug)]
pub struct IdleMode {
    clicks: u32,
    press_start_ms: Option<u64>,
    pending_until_ms: Option<u64>,
    long_press_fired: bool,
}

impl IdleMode {
    pub fn new() -> Self {
        Self {
            clicks: 0,
            press_start_ms: None,
            pending_until_ms: None,
            long_press_fired: false,
        }
    }

    pub fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        ctx.inventory.all_off()?;
        info!("idle: waiting for gesture");
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        ctx.hints = DisplayHints::None;
        let start = ctx.input.start;
        let cfg = ctx.config;

        if start.just_pressed {
            let stale = self
                .pending_until_ms
                .map_or(true, |until| ctx.now_ms > until);
            if stale {
                self.clicks = 0;
            }
            self.pending_until_ms = None;
            self.press_start_ms = Some(ctx.now_ms);
            self.long_press_fired = false;
        }

        if start.down && !self.long_press_fired {
            if let Some(pressed_at) = self.press_start_ms {
                if ctx.now_ms - pressed_at >= cfg.long_press_ms {
                    self.long_press_fired = true;
                    info!("idle: long press, requesting shutdown");
                    return Ok(Some(ModeRequest::Shutdown));
                }
            }
        }

        if start.just_released {
            if let Some(pressed_at) = self.press_start_ms.take() {
                let held = ctx.now_ms - pressed_at;
                if self.long_press_fired {
                    debug!("idle: release after long press, no click");
                } else if held >= cfg.click_bounce_floor_ms {
                    self.clicks += 1;
                    self.pending_until_ms = Some(ctx.now_ms + cfg.multi_click_window_ms);
                    debug!("idle: click {} registered ({held} ms)", self.clicks);
                }
            }
        }

        if !start.down {
            if let Some(until) = self.pending_until_ms {
                if ctx.now_ms > until && self.clicks > 0 {
                    let clicks = self.clicks;
                    self.clicks = 0;
                    self.pending_until_ms = None;
                    return Ok(Some(ModeRequest::Switch(Self::dispatch(clicks))));
                }
            }
        }

        Ok(None)
    }

    /// Click count to mode. Counts past the defined range clamp to the
    /// nearest mapping instead of being dropped.
    fn dispatch(clicks: u32) -> ModeId {
        match clicks {
            1 => ModeId::Playing,
            2 => ModeId::Measurement,
            3 => ModeId::Boot,
            4 => ModeId::Calibration,
            other => {
                warn!("idle: {other} clicks, clamping to 4");
                ModeId::Calibration
            }
        }
    }
}
