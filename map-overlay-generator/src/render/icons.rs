/// Procedural marker icons traced into coverage masks.
use crate::classify::IconShape;
use crate::render::canvas::{Canvas, polygon_spans};
use map_constants::render_settings::Rgba;
use std::f64::consts::PI;

/// Boolean coverage over a square window of canvas pixels.
pub struct Mask {
    x0: i64,
    y0: i64,
    side: usize,
    cells: Vec<bool>,
}

impl Mask {
    /// Window of `2 * radius + 1` pixels centred on (cx, cy).
    pub fn new(cx: i64, cy: i64, radius: i64) -> Self {
        let side = (2 * radius + 1).max(1) as usize;
        Self {
            x0: cx - radius,
            y0: cy - radius,
            side,
            cells: vec![false; side * side],
        }
    }

    pub fn covered(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i])
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let (lx, ly) = (x - self.x0, y - self.y0);
        let side = self.side as i64;
        (lx >= 0 && ly >= 0 && lx < side && ly < side).then(|| (ly * side + lx) as usize)
    }

    fn set(&mut self, x: i64, y: i64, value: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    fn for_each_cell(&mut self, mut f: impl FnMut(f64, f64) -> Option<bool>) {
        let side = self.side as i64;
        for ly in 0..side {
            for lx in 0..side {
                let (x, y) = (self.x0 + lx, self.y0 + ly);
                if let Some(v) = f(x as f64 + 0.5, y as f64 + 0.5) {
                    self.cells[(ly * side + lx) as usize] = v;
                }
            }
        }
    }

    /// Inclusive integer rectangle.
    pub fn rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set(x, y, true);
            }
        }
    }

    /// Rectangle border `width` pixels thick.
    pub fn rect_outline(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, width: i64) {
        self.rect(x0, y0, x1, y0 + width - 1);
        self.rect(x0, y1 - width + 1, x1, y1);
        self.rect(x0, y0, x0 + width - 1, y1);
        self.rect(x1 - width + 1, y0, x1, y1);
    }

    pub fn polygon(&mut self, points: &[(f64, f64)]) {
        let mut spans = Vec::new();
        for ly in 0..self.side as i64 {
            let y = self.y0 + ly;
            polygon_spans(points, y as f64 + 0.5, &mut spans);
            for &(start, end) in &spans {
                for x in start..=end {
                    self.set(x, y, true);
                }
            }
        }
    }

    pub fn disc(&mut self, cx: f64, cy: f64, r: f64) {
        self.for_each_cell(|x, y| ((x - cx).hypot(y - cy) <= r).then_some(true));
    }

    pub fn clear_disc(&mut self, cx: f64, cy: f64, r: f64) {
        self.for_each_cell(|x, y| ((x - cx).hypot(y - cy) <= r).then_some(false));
    }

    pub fn ring(&mut self, cx: f64, cy: f64, r_outer: f64, width: f64) {
        self.for_each_cell(|x, y| {
            let d = (x - cx).hypot(y - cy);
            (d <= r_outer && d > r_outer - width).then_some(true)
        });
    }

    /// Thick segment as a quad.
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = dx.hypot(dy);
        if len == 0.0 {
            return;
        }
        let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
        self.polygon(&[
            (from.0 + nx, from.1 + ny),
            (to.0 + nx, to.1 + ny),
            (to.0 - nx, to.1 - ny),
            (from.0 - nx, from.1 - ny),
        ]);
    }

    /// Blend `color` onto every covered pixel.
    pub fn paint(&self, canvas: &mut Canvas, color: Rgba) {
        let side = self.side as i64;
        for ly in 0..side {
            for lx in 0..side {
                if self.cells[(ly * side + lx) as usize] {
                    canvas.blend(self.x0 + lx, self.y0 + ly, color);
                }
            }
        }
    }
}

fn star(cx: f64, cy: f64, points: usize, r: f64, ri: f64, start: f64) -> Vec<(f64, f64)> {
    (0..points * 2)
        .map(|i| {
            let angle = start + PI * i as f64 / points as f64;
            let radius = if i % 2 == 0 { r } else { ri };
            (cx + radius * angle.cos(), cy - radius * angle.sin())
        })
        .collect()
}

impl IconShape {
    /// Trace the silhouette of edge `s` centred on (cx, cy), grown by `o` pixels.
    pub fn trace(self, mask: &mut Mask, cx: i64, cy: i64, s: i64, o: i64) {
        let (fx, fy) = (cx as f64, cy as f64);
        match self {
            IconShape::Pennant => {
                let hs = s / 2;
                let lw = (s / 10).max(2);
                mask.rect(cx - lw / 2 - o, cy - hs - o, cx + lw / 2 + o, cy + hs + o);
                let flag_h = (hs as f64 * 0.7) as i64;
                let flag_w = (hs as f64 * 0.9) as i64;
                mask.polygon(&[
                    ((cx + lw / 2 + o) as f64, (cy - hs - o) as f64),
                    ((cx + lw / 2 + flag_w + o) as f64, (cy - hs + flag_h / 2) as f64),
                    ((cx + lw / 2 + o) as f64, (cy - hs + flag_h + o) as f64),
                ]);
                let base_w = (hs as f64 * 0.6) as i64;
                mask.rect(cx - base_w - o, cy + hs - lw - o, cx + base_w + o, cy + hs + o);
            }
            IconShape::VaultRing => {
                let r = s / 2 + o;
                let lw = (s / 10).max(2);
                mask.disc(fx, fy, r as f64);
                mask.clear_disc(fx, fy, r as f64 * 0.6);
                mask.rect(cx - lw / 2, cy - r, cx + lw / 2, cy + r);
                mask.rect(cx - r, cy - lw / 2, cx + r, cy + lw / 2);
                mask.disc(fx, fy, (r / 4).max(2) as f64);
            }
            IconShape::BoxedCross => {
                let hs = s / 2 + o;
                let hw = (hs as f64 * 0.9) as i64;
                let lw = (s / 10).max(2);
                mask.rect_outline(cx - hw, cy - hs, cx + hw, cy + hs, lw);
                let (a, b) = ((cx - hw + lw) as f64, (cx + hw - lw) as f64);
                let (top, bottom) = ((cy - hs + lw) as f64, (cy + hs - lw) as f64);
                mask.line((a, top), (b, bottom), lw as f64);
                mask.line((b, top), (a, bottom), lw as f64);
            }
            IconShape::PoiRing => {
                let r = (s / 2 + o) as f64;
                let lw = (s / 12).max(1) as f64;
                mask.ring(fx, fy, r, lw);
                let tick = r * 0.4;
                mask.line((fx, fy - r - 1.0), (fx, fy - r + tick), lw);
                mask.line((fx, fy + r + 1.0), (fx, fy + r - tick), lw);
                mask.line((fx - r - 1.0, fy), (fx - r + tick, fy), lw);
                mask.line((fx + r + 1.0, fy), (fx + r - tick, fy), lw);
            }
            IconShape::MetroRing => {
                let r = s / 2 + o;
                let lw = (s / 8).max(2);
                mask.ring(fx, fy, r as f64, lw as f64);
                mask.rect(cx - r + lw, cy - lw, cx + r - lw, cy + lw);
            }
            IconShape::Skyline => {
                let hs = s / 2 + o;
                let bw = (s / 5).max(2);
                let gap = (s / 16).max(1);
                mask.rect(cx - bw / 2, cy - hs, cx + bw / 2, cy + hs / 2);
                mask.rect(
                    cx - bw - gap - bw / 2,
                    cy - (hs as f64 * 0.5) as i64,
                    cx - gap - bw / 2,
                    cy + hs / 2,
                );
                mask.rect(
                    cx + gap + bw / 2,
                    cy - (hs as f64 * 0.7) as i64,
                    cx + bw + gap + bw / 2,
                    cy + hs / 2,
                );
                mask.rect(
                    cx - bw - gap - bw / 2 - o,
                    cy + hs / 2,
                    cx + bw + gap + bw / 2 + o,
                    cy + hs / 2 + (s / 14).max(1),
                );
            }
            IconShape::SixPointStar => {
                let r = (s / 2 + o) as f64;
                mask.polygon(&star(fx, fy, 6, r, r * 0.5, PI / 2.0));
            }
            IconShape::Chevron => {
                let hs = (s / 2 + o) as f64;
                let hw = hs * 0.7;
                mask.polygon(&[
                    (fx - hw, fy - hs / 2.0),
                    (fx, fy + hs / 2.0),
                    (fx + hw, fy - hs / 2.0),
                    (fx + hw / 2.0, fy - hs / 2.0),
                    (fx, fy),
                    (fx - hw / 2.0, fy - hs / 2.0),
                ]);
            }
            IconShape::FourPointStar => {
                let r = (s / 2 + o) as f64;
                mask.polygon(&star(fx, fy, 4, r, r * 0.3, PI / 4.0));
            }
            IconShape::Page => {
                let hs = s / 2 + o;
                let bw = ((hs as f64 * 0.8) as i64).max(1);
                mask.rect(cx - bw, cy - hs, cx + bw, cy + hs);
            }
            IconShape::Shield => {
                let hs = (s / 2 + o) as f64;
                let hw = hs * 0.7;
                mask.polygon(&[
                    (fx, fy + hs),
                    (fx - hw, fy - hs / 3.0),
                    (fx - hw, fy - hs),
                    (fx + hw, fy - hs),
                    (fx + hw, fy - hs / 3.0),
                ]);
            }
            IconShape::Dot => {
                mask.disc(fx, fy, (s / 2 + o) as f64);
            }
            IconShape::Diamond => {
                let r = (s / 2 + o) as f64;
                mask.polygon(&[(fx, fy - r), (fx + r, fy), (fx, fy + r), (fx - r, fy)]);
            }
        }
    }

    /// Extra detail drawn over the fill, if the shape has any.
    fn detail(self, mask: &mut Mask, cx: i64, cy: i64, s: i64) -> bool {
        match self {
            IconShape::Page => {
                let hs = s / 2;
                let bw = ((hs as f64 * 0.8) as i64).max(1);
                let fold = (hs / 2).max(1);
                mask.polygon(&[
                    ((cx + bw - fold) as f64, (cy - hs) as f64),
                    ((cx + bw + 1) as f64, (cy - hs) as f64),
                    ((cx + bw + 1) as f64, (cy - hs + fold + 1) as f64),
                ]);
                true
            }
            _ => false,
        }
    }
}

const PAGE_FOLD: Rgba = [0, 0, 0, 100];

/// Draw an icon of edge `size` (canvas pixels) centred on (cx, cy): a dark
/// silhouette grown by `grow`, then the fill colour.
pub fn draw_icon(
    canvas: &mut Canvas,
    shape: IconShape,
    cx: i64,
    cy: i64,
    size: u32,
    grow: u32,
    fill: Rgba,
    outline: Rgba,
) {
    let s = i64::from(size);
    let o = i64::from(grow);
    let radius = s + o + 2;

    let mut silhouette = Mask::new(cx, cy, radius);
    shape.trace(&mut silhouette, cx, cy, s, o);
    silhouette.paint(canvas, outline);

    let mut body = Mask::new(cx, cy, radius);
    shape.trace(&mut body, cx, cy, s, 0);
    body.paint(canvas, fill);

    let mut detail = Mask::new(cx, cy, radius);
    if shape.detail(&mut detail, cx, cy, s) {
        detail.paint(canvas, PAGE_FOLD);
    }
}
