//! Calibrated projection layout store.
//!
//! One transform per target plus one for the center icon. Created with
//! defaults (canvas center, unit scale, zero rotation), mutated only by the
//! calibration mode, read by the rendering collaborator. The clamping rules
//! live here so every writer gets them for free.

use serde::Serialize;

/// Which layout entry a transform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutItem {
    Center,
    Target(usize),
}

/// Position, rotation and scale of one projected item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    /// Degrees, kept in `[0, 360)`.
    pub rotation_deg: f32,
    pub scale: f32,
}

pub struct CalibratedLayout {
    canvas_width: f32,
    canvas_height: f32,
    center: Transform,
    targets: Vec<Transform>,
}

impl CalibratedLayout {
    pub fn new(canvas_width: f32, canvas_height: f32, target_count: usize) -> Self {
        let default = Transform {
            x: canvas_width / 2.0,
            y: canvas_height / 2.0,
            rotation_deg: 0.0,
            scale: 1.0,
        };
        Self {
            canvas_width,
            canvas_height,
            center: default,
            targets: vec![default; target_count],
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn get(&self, item: LayoutItem) -> Transform {
        match item {
            LayoutItem::Center => self.center,
            LayoutItem::Target(i) => self.targets[i],
        }
    }

    /// Commit a transform, applying position/rotation clamps. Scale clamping
    /// is the caller's business because the bounds differ per item kind.
    pub fn set(&mut self, item: LayoutItem, transform: Transform) {
        let clamped = Transform {
            x: transform.x.clamp(0.0, self.canvas_width),
            y: transform.y.clamp(0.0, self.canvas_height),
            rotation_deg: wrap_degrees(transform.rotation_deg),
            scale: transform.scale,
        };
        match item {
            LayoutItem::Center => self.center = clamped,
            LayoutItem::Target(i) => self.targets[i] = clamped,
        }
    }

    pub fn clamp_position(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(0.0, self.canvas_width), y.clamp(0.0, self.canvas_height))
    }
}

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}
