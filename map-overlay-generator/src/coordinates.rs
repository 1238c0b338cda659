/// World to canvas projection.
use crate::bounds::WorldBounds;
use crate::config::MapConfig;
use crate::error::BoundsError;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

impl PixelCoord {
    pub fn distance(self, other: PixelCoord) -> f64 {
        (f64::from(self.x) - f64::from(other.x)).hypot(f64::from(self.y) - f64::from(other.y))
    }
}

impl fmt::Display for PixelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed affine map from world X/Y onto a square canvas, Y flipped so north is up.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    bounds: WorldBounds,
    size: u32,
}

impl CoordinateMapper {
    pub fn new(bounds: WorldBounds, size: u32) -> Self {
        Self { bounds, size }
    }

    /// Mapper for the final texture.
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.world, config.canvas_size)
    }

    /// The same projection onto a canvas `factor` times larger.
    pub fn scaled(&self, factor: u32) -> Self {
        Self::new(self.bounds, self.size * factor)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Unrounded, unclamped canvas position. Used for geometry that may leave the canvas.
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        let size = f64::from(self.size);
        (self.bounds.normalize_x(x) * size, self.bounds.normalize_y_down(y) * size)
    }

    /// Pixel for a world position, clamped to the canvas. Positions outside the
    /// world bounds still get a pixel, carried in the error.
    pub fn project(&self, x: f64, y: f64) -> Result<PixelCoord, BoundsError> {
        let (fx, fy) = self.to_canvas(x, y);
        let max = f64::from(self.size - 1);
        let pixel = PixelCoord {
            x: fx.round().clamp(0.0, max) as u32,
            y: fy.round().clamp(0.0, max) as u32,
        };
        if self.bounds.contains(x, y) {
            Ok(pixel)
        } else {
            Err(BoundsError {
                x,
                y,
                clamped: pixel,
            })
        }
    }

    /// `project`, discarding whether clamping happened.
    pub fn project_clamped(&self, x: f64, y: f64) -> PixelCoord {
        self.project(x, y).unwrap_or_else(|e| e.clamped)
    }

    /// Convert a world-space distance into canvas pixels along X.
    pub fn world_to_pixels(&self, distance: f64) -> f64 {
        distance / (self.bounds.max_x - self.bounds.min_x) * f64::from(self.size)
    }

    pub fn pixels_to_world(&self, pixels: f64) -> f64 {
        pixels / f64::from(self.size) * (self.bounds.max_x - self.bounds.min_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(WorldBounds::default(), 8192)
    }

    #[test]
    fn extreme_corners_map_to_canvas_corners() {
        let m = mapper();
        assert_eq!(m.project(-135168.0, 106496.0).unwrap(), PixelCoord { x: 0, y: 0 });
        assert_eq!(
            m.project(118784.0, -147456.0).unwrap(),
            PixelCoord { x: 8191, y: 8191 }
        );
    }

    #[test]
    fn centre_maps_to_centre() {
        let m = mapper();
        let cx = (-135168.0 + 118784.0) / 2.0;
        let cy = (-147456.0 + 106496.0) / 2.0;
        assert_eq!(m.project(cx, cy).unwrap(), PixelCoord { x: 4096, y: 4096 });
    }

    #[test]
    fn interior_points_stay_inside() {
        let m = mapper();
        for i in 1..100 {
            let t = f64::from(i) / 100.0;
            let x = -135168.0 + t * 253952.0;
            let y = 106496.0 - t * 253952.0;
            let p = m.project(x, y).unwrap();
            assert!(p.x < 8192 && p.y < 8192);
        }
    }

    #[test]
    fn outside_points_are_clamped_and_reported() {
        let m = mapper();
        let err = m.project(-500000.0, 900000.0).unwrap_err();
        assert_eq!(err.clamped, PixelCoord { x: 0, y: 0 });
        let err = m.project(500000.0, -900000.0).unwrap_err();
        assert_eq!(err.clamped, PixelCoord { x: 8191, y: 8191 });
        assert_eq!(m.project_clamped(0.0, 200000.0).y, 0);
    }

    #[test]
    fn scaled_mapper_multiplies_pixels() {
        let m = mapper().scaled(4);
        assert_eq!(m.size(), 32768);
        assert_eq!(m.world_to_pixels(253952.0), 32768.0);
        assert_eq!(mapper().pixels_to_world(300.0), 9300.0);
    }
}
