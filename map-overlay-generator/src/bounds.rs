/// World-space rectangle tracking and normalisation.
use map_constants::coordinate_system::{WORLD_X_MAX, WORLD_X_MIN, WORLD_Y_MAX, WORLD_Y_MIN};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for WorldBounds {
    /// The Commonwealth worldspace.
    fn default() -> Self {
        Self {
            min_x: WORLD_X_MIN,
            max_x: WORLD_X_MAX,
            min_y: WORLD_Y_MIN,
            max_y: WORLD_Y_MAX,
        }
    }
}

impl WorldBounds {
    /// Create empty bounds ready to accumulate points with `update`.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.max_x - self.min_x, self.max_y - self.min_y)
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Normalise X to 0-1 across the bounds (west edge 0).
    pub fn normalize_x(&self, x: f64) -> f64 {
        (x - self.min_x) / (self.max_x - self.min_x)
    }

    /// Normalise Y to 0-1 across the bounds, flipped so the north edge is 0.
    pub fn normalize_y_down(&self, y: f64) -> f64 {
        (self.max_y - y) / (self.max_y - self.min_y)
    }

    /// Bounds shrunk by `inset` on every side.
    pub fn inset(&self, inset: f64) -> Self {
        Self {
            min_x: self.min_x + inset,
            max_x: self.max_x - inset,
            min_y: self.min_y + inset,
            max_y: self.max_y - inset,
        }
    }
}
