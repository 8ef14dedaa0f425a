//! Drag-to-pan and tap-to-select over the laid out graph.
//!
//! Offsets move the canvas center relative to the view center. Past the pan
//! bounds a drag keeps moving at the elasticity rate; on release the canvas
//! coasts and then springs back inside the bounds.

use eframe::egui::{Pos2, Vec2, vec2};

use crate::layout::{LayoutConfig, LayoutNode};

pub const TAP_SLOP: f32 = 8.0;
const RELEASE_VELOCITY_SCALE: f32 = 0.8;
const DECELERATION: f32 = 0.995;
const REST_SPEED: f32 = 0.02;
const SPRING_TIME_MS: f32 = 90.0;
const SPRING_SNAP: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanBounds {
    pub max_x: f32,
    pub max_y: f32,
}

impl PanBounds {
    pub fn for_view(view_size: Vec2, config: &LayoutConfig) -> Self {
        Self {
            max_x: config
                .min_pan_range
                .max((config.canvas_size - view_size.x) / 2.0),
            max_y: config
                .min_pan_range
                .max((config.canvas_size - view_size.y) / 2.0),
        }
    }

    pub fn contains(&self, offset: Vec2) -> bool {
        offset.x.abs() <= self.max_x && offset.y.abs() <= self.max_y
    }

    pub fn clamp(&self, offset: Vec2) -> Vec2 {
        vec2(
            offset.x.clamp(-self.max_x, self.max_x),
            offset.y.clamp(-self.max_y, self.max_y),
        )
    }

    pub fn soft_clamp(&self, offset: Vec2, elasticity: f32) -> Vec2 {
        vec2(
            soft_clamp(offset.x, -self.max_x, self.max_x, elasticity),
            soft_clamp(offset.y, -self.max_y, self.max_y, elasticity),
        )
    }
}

/// Inside `min..=max` the value passes through; beyond it only `amount` of
/// the overshoot is kept.
pub fn soft_clamp(value: f32, min: f32, max: f32, amount: f32) -> f32 {
    if value < min {
        min + (value - min) * amount
    } else if value > max {
        max + (value - max) * amount
    } else {
        value
    }
}

pub fn graph_point(pointer: Pos2, view_center: Pos2, offset: Vec2, config: &LayoutConfig) -> Vec2 {
    let origin = view_center.to_vec2() - Vec2::splat(config.half_canvas()) + offset;
    pointer.to_vec2() - origin
}

pub fn hit_test<'a>(
    layout: &'a [LayoutNode],
    point: Vec2,
    config: &LayoutConfig,
) -> Option<&'a LayoutNode> {
    let half = Vec2::splat(config.half_canvas());
    layout.iter().find(|node| {
        let center = half + node.position;
        (point - center).length_sq() <= node.radius() * node.radius()
    })
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    Idle,
    Dragging {
        pointer_start: Pos2,
        pointer_last: Pos2,
        offset_start: Vec2,
        hit: Option<String>,
    },
    Coasting,
    Settling,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Release {
    Tap(String),
    Pan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanController {
    offset: Vec2,
    velocity: Vec2,
    phase: Phase,
}

impl Default for PanController {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
            phase: Phase::Idle,
        }
    }
}

impl PanController {
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn last_pointer(&self) -> Option<Pos2> {
        match &self.phase {
            Phase::Dragging { pointer_last, .. } => Some(*pointer_last),
            _ => None,
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Coasting | Phase::Settling)
    }

    pub fn begin(
        &mut self,
        pointer: Pos2,
        view_center: Pos2,
        layout: &[LayoutNode],
        config: &LayoutConfig,
    ) {
        let point = graph_point(pointer, view_center, self.offset, config);
        let hit = hit_test(layout, point, config).map(|node| node.id.clone());
        self.velocity = Vec2::ZERO;
        self.phase = Phase::Dragging {
            pointer_start: pointer,
            pointer_last: pointer,
            offset_start: self.offset,
            hit,
        };
    }

    pub fn drag(&mut self, pointer: Pos2, bounds: &PanBounds, elasticity: f32) {
        if let Phase::Dragging {
            pointer_start,
            pointer_last,
            offset_start,
            ..
        } = &mut self.phase
        {
            *pointer_last = pointer;
            let next = *offset_start + (pointer - *pointer_start);
            self.offset = bounds.soft_clamp(next, elasticity);
        }
    }

    /// Ends a gesture. `velocity` is the pointer velocity in px/ms.
    pub fn release(&mut self, pointer: Pos2, velocity: Vec2, bounds: &PanBounds) -> Option<Release> {
        let Phase::Dragging {
            pointer_start, hit, ..
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return None;
        };

        if pointer.distance(pointer_start) < TAP_SLOP {
            if !bounds.contains(self.offset) {
                self.phase = Phase::Settling;
            }
            return Some(match hit {
                Some(id) => Release::Tap(id),
                None => Release::Pan,
            });
        }

        self.velocity = velocity * RELEASE_VELOCITY_SCALE;
        self.phase = Phase::Coasting;
        Some(Release::Pan)
    }

    pub fn step(&mut self, dt_ms: f32, bounds: &PanBounds) {
        if dt_ms <= 0.0 {
            return;
        }

        if self.phase == Phase::Coasting {
            let kappa = 1.0 - DECELERATION;
            let retained = (-kappa * dt_ms).exp();
            self.offset += self.velocity * ((1.0 - retained) / kappa);
            self.velocity *= retained;
            if self.velocity.length() < REST_SPEED {
                self.velocity = Vec2::ZERO;
                self.phase = Phase::Settling;
            }
        }

        if self.phase == Phase::Settling {
            let target = bounds.clamp(self.offset);
            let pull = 1.0 - (-dt_ms / SPRING_TIME_MS).exp();
            self.offset += (target - self.offset) * pull;
            if (target - self.offset).length() < SPRING_SNAP {
                self.offset = target;
                self.phase = Phase::Idle;
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
