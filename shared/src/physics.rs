//! Vector math and arena geometry shared by the simulation and the resolver.

use serde::{Deserialize, Serialize};

use crate::{PLAYER_SIZE, WORLD_HEIGHT, WORLD_WIDTH};

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    ///Unit vector pointing along `angle` (radians).
    pub fn from_angle(angle: f32) -> Vector2 {
        Vector2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Playing field bounds. Every position clamp and boundary-exit check uses one of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Inclusive bounds check: `[0, width] x [0, height]`.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    pub fn clamp(&self, point: Vector2) -> Vector2 {
        Vector2 {
            x: point.x.clamp(0.0, self.width),
            y: point.y.clamp(0.0, self.height),
        }
    }

    /// Upper-left corner range a player box can spawn in without poking out of the arena.
    pub fn spawn_extent(&self) -> Vector2 {
        Vector2 {
            x: (self.width - PLAYER_SIZE).max(0.0),
            y: (self.height - PLAYER_SIZE).max(0.0),
        }
    }
}

/// Circle vs axis-aligned box overlap. The box is given by its top-left corner and size.
///
/// Touching counts as a miss, the same convention the box-vs-box checks use.
pub fn circle_intersects_box(center: Vector2, radius: f32, corner: Vector2, size: f32) -> bool {
    let nearest_x = center.x.clamp(corner.x, corner.x + size);
    let nearest_y = center.y.clamp(corner.y, corner.y + size);

    let dx = center.x - nearest_x;
    let dy = center.y - nearest_y;

    dx * dx + dy * dy < radius * radius
}
