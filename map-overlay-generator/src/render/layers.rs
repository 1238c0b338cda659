/// Full-canvas layers: grid, playable-area border, threat zones and watermark.
use crate::config::{MapConfig, ThreatZone};
use crate::coordinates::CoordinateMapper;
use crate::render::canvas::Canvas;
use crate::render::text::{draw_text, draw_text_shadowed, measure};
use map_constants::coordinate_system::GRID_EDGE_MARGIN_PX;
use map_constants::render_settings::{
    BORDER_COLOR, BORDER_DASH, BORDER_GAP, BORDER_WIDTH, FONT_GRID_PX, FONT_WATERMARK_PX,
    GRID_COLOR, GRID_LABEL_COLOR, SHADOW_OFFSET, WATERMARK_COLOR, WATERMARK_SHADOW,
};

/// Column names `1A..1Z`, `2A..2Z`, ...
pub fn column_label(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("{}{letter}", index / 26 + 1)
}

pub fn row_label(index: usize) -> String {
    format!("{:02}", index + 1)
}

/// World coordinates of the grid lines along one axis, ascending.
pub fn grid_lines(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    let first = (min / spacing).ceil() as i64;
    let last = (max / spacing).floor() as i64;
    (first..=last).map(|i| i as f64 * spacing).collect()
}

/// Thin grid lines with column labels along the top and row labels down the left.
/// `scale` converts final pixels into canvas pixels.
pub fn draw_grid(canvas: &mut Canvas, mapper: &CoordinateMapper, config: &MapConfig, scale: u32) {
    let s = i64::from(scale);
    let size = i64::from(mapper.size());
    let margin = i64::from(GRID_EDGE_MARGIN_PX) * s;
    let font = FONT_GRID_PX * scale;
    let world = mapper.bounds();

    for (col, wx) in grid_lines(world.min_x, world.max_x, config.grid_spacing)
        .into_iter()
        .enumerate()
    {
        let px = mapper.to_canvas(wx, 0.0).0.round() as i64;
        if px <= margin || px >= size - margin {
            continue;
        }
        canvas.fill_rect(px, 0, px + s - 1, size - 1, GRID_COLOR);
        draw_text(canvas, px - 12 * s, 16 * s, &column_label(col), font, GRID_LABEL_COLOR);
    }

    let rows = grid_lines(world.min_y, world.max_y, config.grid_spacing);
    for (row, wy) in rows.into_iter().rev().enumerate() {
        let py = mapper.to_canvas(0.0, wy).1.round() as i64;
        if py <= margin || py >= size - margin {
            continue;
        }
        canvas.fill_rect(0, py, size - 1, py + s - 1, GRID_COLOR);
        draw_text(canvas, 16 * s, py - 12 * s, &row_label(row), font, GRID_LABEL_COLOR);
    }
}

/// Dashed rectangle inset from the world edges.
pub fn draw_border(canvas: &mut Canvas, mapper: &CoordinateMapper, config: &MapConfig, scale: u32) {
    let inner = mapper.bounds().inset(config.border_inset);
    if inner.is_empty() {
        return;
    }
    let (x0, y0) = mapper.to_canvas(inner.min_x, inner.max_y);
    let (x1, y1) = mapper.to_canvas(inner.max_x, inner.min_y);
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    let s = f64::from(scale);
    let width = f64::from(BORDER_WIDTH) * s;
    let (dash, gap) = (f64::from(BORDER_DASH) * s, f64::from(BORDER_GAP) * s);

    for i in 0..4 {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % 4];
        let len = (bx - ax).hypot(by - ay);
        if len < 1.0 {
            continue;
        }
        let (ux, uy) = ((bx - ax) / len, (by - ay) / len);
        let mut pos = 0.0;
        while pos < len {
            let end = (pos + dash).min(len);
            let (sx, sy) = (ax + ux * pos, ay + uy * pos);
            let (ex, ey) = (ax + ux * end, ay + uy * end);
            let half = width / 2.0;
            canvas.fill_rect(
                (sx.min(ex) - half).round() as i64,
                (sy.min(ey) - half).round() as i64,
                (sx.max(ex) + half).round() as i64 - 1,
                (sy.max(ey) + half).round() as i64 - 1,
                BORDER_COLOR,
            );
            pos += dash + gap;
        }
    }
}

/// Fill every zone polygon, in order.
pub fn draw_threat_zones(canvas: &mut Canvas, mapper: &CoordinateMapper, zones: &[ThreatZone]) {
    for zone in zones {
        let points: Vec<(f64, f64)> = zone
            .polygon
            .iter()
            .map(|&[x, y]| mapper.to_canvas(x, y))
            .collect();
        canvas.fill_polygon(&points, zone.color);
    }
}

/// Faint text in the bottom-right corner.
pub fn draw_watermark(canvas: &mut Canvas, text: &str, scale: u32) {
    let s = i64::from(scale);
    let height = FONT_WATERMARK_PX * scale;
    let (w, _) = measure(text, height);
    let x = i64::from(canvas.width()) - w - 30 * s;
    let y = i64::from(canvas.height()) - 45 * s;
    draw_text_shadowed(
        canvas,
        x,
        y,
        text,
        height,
        WATERMARK_COLOR,
        WATERMARK_SHADOW,
        i64::from(SHADOW_OFFSET) * s,
    );
}
