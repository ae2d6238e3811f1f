//! Per-frame input snapshot supplied by the host.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space ray from the camera through the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray straight down onto `(x, y)` from high above.
    pub fn looking_down_at(x: f32, y: f32) -> Self {
        Self::new(Vec3::new(x, y, 50.0), Vec3::NEG_Z)
    }

    /// Where the ray crosses the plane `z = height`.
    pub fn at_height(&self, height: f32) -> Option<Vec3> {
        crate::util::point_at_z(self.origin, self.direction, height)
    }
}

/// Mouse state for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Cursor position in game-space pixels.
    pub mouse_position: [f32; 2],
    /// Pressed this frame.
    pub left_click: bool,
    pub right_click: bool,
    /// Currently held down.
    pub left_held: bool,
    pub right_held: bool,
    pub camera_ray: Option<Ray>,
}

impl FrameInput {
    /// No buttons, cursor at `mouse` with no camera ray.
    pub fn idle_at(mouse: [f32; 2]) -> Self {
        Self {
            mouse_position: mouse,
            ..Self::default()
        }
    }

    pub fn with_ray(mut self, ray: Ray) -> Self {
        self.camera_ray = Some(ray);
        self
    }

    /// Left button pressed this frame (and therefore held).
    pub fn clicked(mut self) -> Self {
        self.left_click = true;
        self.left_held = true;
        self
    }

    pub fn holding(mut self) -> Self {
        self.left_held = true;
        self
    }

    pub fn right_clicked(mut self) -> Self {
        self.right_click = true;
        self.right_held = true;
        self
    }
}
