/// Run configuration with defaults from the shared constants crate.
use crate::bounds::WorldBounds;
use crate::error::PipelineError;
use map_constants::coordinate_system::{BORDER_INSET, DEDUP_RADIUS_PX, GRID_SPACING, GROUP_THRESHOLD};
use map_constants::render_settings::Rgba;
use map_constants::texture::{CANVAS_SIZE, PREVIEW_SIZE, SUPERSAMPLE};
use map_constants::threat_zones::THREAT_ZONES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A shaded world-space polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatZone {
    pub name: String,
    pub color: Rgba,
    pub polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub world: WorldBounds,
    /// Final texture edge in pixels. Must be a power of two, at least 4.
    pub canvas_size: u32,
    /// Linear oversampling factor for overlay drawing.
    pub supersample: u32,
    /// Maximum world distance (inclusive) for folding a collectible into a location.
    pub group_threshold: f64,
    /// Final-pixel radius inside which markers from different files are duplicates.
    pub dedup_radius_px: f64,
    pub grid_spacing: f64,
    pub border_inset: f64,
    pub threat_zones: Vec<ThreatZone>,
    pub preview_size: u32,
    pub watermark: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            world: WorldBounds::default(),
            canvas_size: CANVAS_SIZE,
            supersample: SUPERSAMPLE,
            group_threshold: GROUP_THRESHOLD,
            dedup_radius_px: DEDUP_RADIUS_PX,
            grid_spacing: GRID_SPACING,
            border_inset: BORDER_INSET,
            threat_zones: THREAT_ZONES
                .iter()
                .map(|z| ThreatZone {
                    name: z.name.to_string(),
                    color: z.color,
                    polygon: z.polygon.iter().map(|&(x, y)| [x, y]).collect(),
                })
                .collect(),
            preview_size: PREVIEW_SIZE,
            watermark: None,
        }
    }
}

impl MapConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| PipelineError::ConfigJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let fail = |msg: String| Err(PipelineError::Config(msg));

        if self.canvas_size < 4 || !self.canvas_size.is_power_of_two() {
            return fail(format!(
                "canvas size {} must be a power of two of at least 4",
                self.canvas_size
            ));
        }
        if self.supersample == 0 {
            return fail("supersample factor must be at least 1".into());
        }
        if self.canvas_size.checked_mul(self.supersample).is_none() {
            return fail(format!(
                "canvas size {} x supersample {} overflows",
                self.canvas_size, self.supersample
            ));
        }
        let (w, h) = self.world.dimensions();
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return fail(format!("world bounds {:?} are degenerate", self.world));
        }
        if !(self.group_threshold.is_finite() && self.group_threshold >= 0.0) {
            return fail(format!("group threshold {} must be >= 0", self.group_threshold));
        }
        if !(self.dedup_radius_px.is_finite() && self.dedup_radius_px >= 0.0) {
            return fail(format!("dedup radius {} must be >= 0", self.dedup_radius_px));
        }
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return fail(format!("grid spacing {} must be > 0", self.grid_spacing));
        }
        if self.preview_size == 0 {
            return fail("preview size must be at least 1".into());
        }
        if let Some(zone) = self.threat_zones.iter().find(|z| z.polygon.len() < 3) {
            return fail(format!("threat zone {:?} needs at least 3 points", zone.name));
        }
        Ok(())
    }

    /// Edge of the supersampled drawing canvas.
    pub fn render_size(&self) -> u32 {
        self.canvas_size * self.supersample
    }
}
