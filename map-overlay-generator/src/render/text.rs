/// Bitmap label text and collision-avoiding label placement.
use crate::render::canvas::Canvas;
use font8x8::legacy::BASIC_LEGACY;
use map_constants::render_settings::Rgba;

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Size of one font cell for a glyph `height` pixels tall.
pub fn cell_size(height: u32) -> i64 {
    i64::from((height / 8).max(1))
}

/// Width and height of `text` in canvas pixels.
pub fn measure(text: &str, height: u32) -> (i64, i64) {
    let cell = cell_size(height);
    (text.chars().count() as i64 * 8 * cell, 8 * cell)
}

/// Draw `text` with its top-left corner at (x, y).
pub fn draw_text(canvas: &mut Canvas, x: i64, y: i64, text: &str, height: u32, color: Rgba) {
    let cell = cell_size(height);
    for (i, ch) in text.chars().enumerate() {
        let glyph = glyph_for_char(ch);
        let gx = x + i as i64 * 8 * cell;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) != 0 {
                    let px = gx + col as i64 * cell;
                    let py = y + row as i64 * cell;
                    canvas.fill_rect(px, py, px + cell - 1, py + cell - 1, color);
                }
            }
        }
    }
}

/// Text with a single offset drop shadow underneath.
pub fn draw_text_shadowed(
    canvas: &mut Canvas,
    x: i64,
    y: i64,
    text: &str,
    height: u32,
    color: Rgba,
    shadow: Rgba,
    offset: i64,
) {
    draw_text(canvas, x + offset, y + offset, text, height, shadow);
    draw_text(canvas, x, y, text, height, color);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl LabelBox {
    fn overlaps(&self, other: &LabelBox) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }
}

/// First-come label placement: tries eight offsets around the preferred
/// position and keeps the first that collides with nothing already placed.
pub struct LabelPlacer {
    canvas_size: i64,
    margin: i64,
    placed: Vec<LabelBox>,
}

impl LabelPlacer {
    pub fn new(canvas_size: u32, margin: i64) -> Self {
        Self {
            canvas_size: i64::from(canvas_size),
            margin,
            placed: Vec::new(),
        }
    }

    pub fn placed(&self) -> &[LabelBox] {
        &self.placed
    }

    /// Place a `w` x `h` box near (x, y); `gap` spaces the alternatives.
    /// Falls back to the preferred position when every candidate collides.
    pub fn try_place(&mut self, x: i64, y: i64, w: i64, h: i64, gap: i64) -> (i64, i64) {
        let offsets = [
            (0, 0),
            (0, h + gap),
            (0, -(h + gap)),
            (w + 2 * gap, 0),
            (-(w + 2 * gap), 0),
            (0, h * 2 + 2 * gap),
            (w + gap, h + gap),
            (-(w + gap), -(h + gap)),
        ];
        let max_x = (self.canvas_size - w - self.margin).max(self.margin);
        let max_y = (self.canvas_size - h - self.margin).max(self.margin);
        for (dx, dy) in offsets {
            let nx = (x + dx).clamp(self.margin, max_x);
            let ny = (y + dy).clamp(self.margin, max_y);
            let candidate = LabelBox {
                x0: nx,
                y0: ny,
                x1: nx + w,
                y1: ny + h,
            };
            if !self.placed.iter().any(|b| b.overlaps(&candidate)) {
                self.placed.push(candidate);
                return (nx, ny);
            }
        }
        self.placed.push(LabelBox {
            x0: x,
            y0: y,
            x1: x + w,
            y1: y + h,
        });
        (x, y)
    }
}
