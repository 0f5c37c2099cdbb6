//! Mode state machine.
//!
//! Exactly one mode is alive at any time. Transitions are synchronous with
//! respect to the tick loop: the outgoing mode's exit completes (indicators
//! off, mode-local state dropped) before the incoming mode's enter runs, so
//! no update or render call ever observes a half-finished transition.
//! Mode-local state lives inside each variant and dies with it on exit.

pub mod blink;
pub mod boot;
pub mod calibration;
pub mod context;
pub mod idle;
pub mod measurement;
pub mod playing;

use crate::error::Result;
use boot::BootMode;
use calibration::CalibrationMode;
use context::TickContext;
use idle::IdleMode;
use log::info;
use measurement::MeasurementMode;
use playing::PlayingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeId {
    Boot,
    Idle,
    Playing,
    Measurement,
    Calibration,
}

/// What a mode asks of the machine at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Switch(ModeId),
    Shutdown,
}

enum Mode {
    Boot(BootMode),
    Idle(IdleMode),
    Playing(PlayingMode),
    Measurement(MeasurementMode),
    Calibration(CalibrationMode),
}

impl Mode {
    fn create(id: ModeId) -> Self {
        match id {
            ModeId::Boot => Self::Boot(BootMode::new()),
            ModeId::Idle => Self::Idle(IdleMode::new()),
            ModeId::Playing => Self::Playing(PlayingMode::new()),
            ModeId::Measurement => Self::Measurement(MeasurementMode::new()),
            ModeId::Calibration => Self::Calibration(CalibrationMode::new()),
        }
    }

    fn id(&self) -> ModeId {
        match self {
            Self::Boot(_) => ModeId::Boot,
            Self::Idle(_) => ModeId::Idle,
            Self::Playing(_) => ModeId::Playing,
            Self::Measurement(_) => ModeId::Measurement,
            Self::Calibration(_) => ModeId::Calibration,
        }
    }

    fn enter(&mut self, ctx: &mut TickContext) -> Result<()> {
        match self {
            Self::Boot(m) => m.enter(ctx),
            Self::Idle(m) => m.enter(ctx),
            Self::Playing(m) => m.enter(ctx),
            Self::Measurement(m) => m.enter(ctx),
            Self::Calibration(m) => m.enter(ctx),
        }
    }

    fn update(&mut self, ctx: &mut TickContext) -> Result<Option<ModeRequest>> {
        match self {
            Self::Boot(m) => m.update(ctx),
            Self::Idle(m) => m.update(ctx),
            Self::Playing(m) => m.update(ctx),
            Self::Measurement(m) => m.update(ctx),
            Self::Calibration(m) => m.update(ctx),
        }
    }
}

pub struct GameStateMachine {
    current: Option<Mode>,
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn current_id(&self) -> Option<ModeId> {
        self.current.as_ref().map(Mode::id)
    }

    /// Exit the current mode (indicators off, state dropped) and enter the
    /// next one.
    pub fn set_mode(&mut self, id: ModeId, ctx: &mut TickContext) -> Result<()> {
        if let Some(old) = self.current.take() {
            info!("mode: {:?} -> {id:?}", old.id());
            ctx.inventory.all_off()?;
        } else {
            info!("mode: entering {id:?}");
        }
        let mut mode = Mode::create(id);
        mode.enter(ctx)?;
        self.current = Some(mode);
        Ok(())
    }

    /// Advance the active mode one tick. Returns `true` when the mode asked
    /// for process shutdown. Mode switches are handled internally.
    pub fn update(&mut self, ctx: &mut TickContext) -> Result<bool> {
        let Some(mode) = self.current.as_mut() else {
            return Ok(false);
        };
        match mode.update(ctx)? {
            Some(ModeRequest::Switch(next)) => {
                self.set_mode(next, ctx)?;
                Ok(false)
            }
            Some(ModeRequest::Shutdown) => Ok(true),
            None => Ok(false),
        }
    }
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
