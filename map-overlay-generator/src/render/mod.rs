//! Overlay composition: layers drawn on a supersampled transparent canvas,
//! reduced to final resolution and composited over the base imagery.

pub mod canvas;
pub mod icons;
pub mod layers;
pub mod text;

use crate::classify::{DisplayStyle, Layout, ProjectedMarker};
use crate::config::MapConfig;
use crate::coordinates::CoordinateMapper;
use crate::error::PipelineError;
use canvas::{Canvas, filled};
use icons::draw_icon;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use map_constants::render_settings::{
    BADGE_SPACING, FONT_BADGE_PX, OUTLINE_DARK, OUTLINE_GROW, SHADOW_OFFSET, TEXT_SHADOW, WHITE_DIM,
};
use map_constants::texture::BACKGROUND;
use std::path::Path;
use text::{LabelPlacer, draw_text_shadowed, measure};
use tracing::{info, warn};

/// Load the base satellite image at `size` x `size`, resizing if needed.
/// Without a path, a flat background is used.
pub fn load_base_image(path: Option<&Path>, size: u32) -> Result<RgbaImage, PipelineError> {
    let Some(path) = path else {
        info!(size, "No base image given, using flat background");
        return Ok(filled(size, size, BACKGROUND));
    };
    let base = image::open(path)
        .map_err(|source| PipelineError::BaseImage {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    if base.dimensions() == (size, size) {
        info!(path = %path.display(), size, "Loaded base image");
        return Ok(base);
    }
    warn!(
        path = %path.display(),
        width = base.width(),
        height = base.height(),
        size,
        "Base image does not match the canvas, resampling"
    );
    Ok(imageops::resize(&base, size, size, FilterType::Lanczos3))
}

pub struct CanvasRenderer<'c> {
    config: &'c MapConfig,
    /// Projection onto the supersampled canvas.
    mapper: CoordinateMapper,
    scale: u32,
}

impl<'c> CanvasRenderer<'c> {
    pub fn new(config: &'c MapConfig) -> Self {
        Self {
            config,
            mapper: CoordinateMapper::from_config(config).scaled(config.supersample),
            scale: config.supersample,
        }
    }

    /// Canvas pixel of a marker on the supersampled canvas (its centre cell).
    fn centre(&self, marker: &ProjectedMarker) -> (i64, i64) {
        let s = i64::from(self.scale);
        (
            i64::from(marker.pixel.x) * s + s / 2,
            i64::from(marker.pixel.y) * s + s / 2,
        )
    }

    fn icon(&self, canvas: &mut Canvas, style: &DisplayStyle, cx: i64, cy: i64) {
        draw_icon(
            canvas,
            style.shape,
            cx,
            cy,
            style.icon_size * self.scale,
            OUTLINE_GROW * self.scale,
            style.color,
            OUTLINE_DARK,
        );
    }

    fn draw_icons(&self, canvas: &mut Canvas, layout: &Layout) {
        for marker in layout.locations.iter().chain(&layout.standalone) {
            let (cx, cy) = self.centre(marker);
            self.icon(canvas, &marker.style, cx, cy);
        }
    }

    /// Labels in priority order (stable), each nudged clear of earlier ones.
    fn draw_labels(&self, canvas: &mut Canvas, layout: &Layout) {
        let s = i64::from(self.scale);
        let mut labelled: Vec<&ProjectedMarker> = layout
            .locations
            .iter()
            .filter(|m| m.style.label.is_some())
            .collect();
        labelled.sort_by_key(|m| m.style.label.map_or(u8::MAX, |l| l.priority));

        let mut placer = LabelPlacer::new(canvas.width(), 4 * s);
        for marker in labelled {
            let Some(label) = marker.style.label else {
                continue;
            };
            let height = label.font_px * self.scale;
            let (tw, th) = measure(&marker.entity.name, height);
            let (cx, cy) = self.centre(marker);
            let x = cx + i64::from(marker.style.icon_size) * s / 2 + 4 * s;
            let y = cy - th / 2;
            let (lx, ly) = placer.try_place(x, y, tw + 6 * s, th + 4 * s, 4 * s);
            draw_text_shadowed(
                canvas,
                lx,
                ly,
                &marker.entity.name,
                height,
                label.color,
                TEXT_SHADOW,
                i64::from(SHADOW_OFFSET) * s,
            );
        }
    }

    /// One mini icon per distinct folded kind below each host, then the total
    /// when more than one collectible is folded.
    fn draw_badges(&self, canvas: &mut Canvas, layout: &Layout) {
        let s = i64::from(self.scale);
        let pitch = i64::from(BADGE_SPACING) * s;
        for host in layout.locations.iter().filter(|m| !m.folded.is_empty()) {
            let kinds = host.badge_kinds();
            let (cx, cy) = self.centre(host);
            let start_x = cx - (kinds.len() as i64 * pitch) / 4;
            let y = cy + i64::from(host.style.icon_size) * s / 2 + 10 * s;
            for (i, kind) in kinds.iter().enumerate() {
                let style = DisplayStyle::for_collectible(*kind);
                self.icon(canvas, &style, start_x + i as i64 * pitch, y);
            }
            if host.folded.len() > 1 {
                let height = FONT_BADGE_PX * self.scale;
                let text = format!("x{}", host.folded.len());
                let x = start_x + kinds.len() as i64 * pitch - pitch / 2;
                draw_text_shadowed(
                    canvas,
                    x,
                    y - i64::from(height) / 2,
                    &text,
                    height,
                    WHITE_DIM,
                    TEXT_SHADOW,
                    i64::from(SHADOW_OFFSET) * s,
                );
            }
        }
    }

    /// Draw every overlay layer and reduce to final resolution. The
    /// supersampled buffer is released before returning.
    pub fn render_overlay(&self, layout: &Layout) -> RgbaImage {
        let size = self.config.render_size();
        info!(size, scale = self.scale, "Rendering overlay");
        let mut canvas = Canvas::new(size, size);

        layers::draw_grid(&mut canvas, &self.mapper, self.config, self.scale);
        layers::draw_border(&mut canvas, &self.mapper, self.config, self.scale);
        layers::draw_threat_zones(&mut canvas, &self.mapper, &self.config.threat_zones);
        self.draw_icons(&mut canvas, layout);
        self.draw_labels(&mut canvas, layout);
        self.draw_badges(&mut canvas, layout);
        if let Some(text) = &self.config.watermark {
            layers::draw_watermark(&mut canvas, text, self.scale);
        }

        let overlay = canvas.downsample(self.scale);
        info!(size = overlay.width(), "Overlay downsampled");
        overlay.into_image()
    }

    /// Overlay composited over `base` at final resolution.
    pub fn render(&self, base: RgbaImage, layout: &Layout) -> RgbaImage {
        let overlay = Canvas::from_image(self.render_overlay(layout));
        overlay.composite_onto(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::markers::{Category, LocationCategory, MarkerEntity, MarkerOrigin};
    use crate::plugin::{FileIndex, RecordIdentifier};
    use crate::report::RunReport;

    fn small_config() -> MapConfig {
        MapConfig {
            canvas_size: 128,
            supersample: 2,
            threat_zones: Vec::new(),
            ..MapConfig::default()
        }
    }

    fn city_at(x: f64, y: f64) -> MarkerEntity {
        MarkerEntity {
            id: RecordIdentifier::new(FileIndex(0), 1),
            name: "Diamond City".into(),
            position: [x, y, 0.0],
            type_code: None,
            category: Category::Location(LocationCategory::City),
            origin: MarkerOrigin::Plugin { file: "A.esm".into() },
            location: None,
        }
    }

    #[test]
    fn base_defaults_to_flat_background() {
        let base = load_base_image(None, 16).unwrap();
        assert_eq!(base.dimensions(), (16, 16));
        assert_eq!(base.get_pixel(3, 3).0, BACKGROUND);
    }

    #[test]
    fn mismatched_base_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.png");
        filled(40, 40, [10, 20, 30, 255]).save(&path).unwrap();
        let base = load_base_image(Some(&path), 16).unwrap();
        assert_eq!(base.dimensions(), (16, 16));
    }

    #[test]
    fn missing_base_is_fatal() {
        let err = load_base_image(Some(Path::new("/nonexistent/base.png")), 16).unwrap_err();
        assert!(matches!(err, PipelineError::BaseImage { .. }));
    }

    #[test]
    fn marker_icon_lands_on_its_pixel() {
        let config = small_config();
        let mut report = RunReport::new();
        let layout = Classifier::new(&config).layout(vec![city_at(0.0, 0.0)], &mut report);
        let pixel = layout.locations[0].pixel;

        let renderer = CanvasRenderer::new(&config);
        let base = filled(128, 128, [0, 0, 0, 255]);
        let out = renderer.render(base, &layout);
        assert_eq!(out.dimensions(), (128, 128));
        let p = out.get_pixel(pixel.x, pixel.y).0;
        assert!(p[0] > 100, "icon not drawn at marker: {p:?}");
        assert_eq!(p[3], 255);
    }

    #[test]
    fn empty_layout_leaves_outer_corners_untouched() {
        let config = MapConfig {
            supersample: 1,
            ..small_config()
        };
        let renderer = CanvasRenderer::new(&config);
        let out = renderer.render(filled(128, 128, [30, 40, 50, 255]), &Layout::default());
        assert_eq!(out.get_pixel(0, 0).0, [30, 40, 50, 255]);
        assert_eq!(out.get_pixel(127, 127).0, [30, 40, 50, 255]);
    }
}
