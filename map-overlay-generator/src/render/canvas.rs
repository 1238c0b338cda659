/// RGBA drawing surface with straight-alpha blending and scanline fills.
use image::imageops::{self, FilterType};
use image::{Rgba as Pixel, RgbaImage};
use map_constants::render_settings::Rgba;
use rayon::prelude::*;

/// Source-over blend of `src` onto one RGBA pixel, both straight alpha.
pub fn blend_pixel(dst: &mut [u8], src: Rgba) {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return;
    }
    let da = u32::from(dst[3]);
    let out_a = sa * 255 + da * (255 - sa);
    for c in 0..3 {
        let value = u32::from(src[c]) * sa * 255 + u32::from(dst[c]) * da * (255 - sa);
        dst[c] = ((value + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

/// Horizontal pixel spans covered by a polygon on the row whose centre is `yc`
/// (even-odd rule). Spans are inclusive and unclamped.
pub fn polygon_spans(points: &[(f64, f64)], yc: f64, spans: &mut Vec<(i64, i64)>) {
    spans.clear();
    let mut xs: Vec<f64> = Vec::with_capacity(8);
    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        if (y0 <= yc) != (y1 <= yc) {
            xs.push(x0 + (yc - y0) / (y1 - y0) * (x1 - x0));
        }
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    for pair in xs.chunks_exact(2) {
        let start = (pair[0] - 0.5).ceil() as i64;
        let end = (pair[1] - 0.5).ceil() as i64 - 1;
        if end >= start {
            spans.push((start, end));
        }
    }
}

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.image.get_pixel(x, y).0
    }

    pub fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height()) {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        blend_pixel(&mut px.0, color);
    }

    /// Blend an inclusive rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba) {
        let w = i64::from(self.width());
        let h = i64::from(self.height());
        let (x0, x1) = (x0.max(0), x1.min(w - 1));
        let (y0, y1) = (y0.max(0), y1.min(h - 1));
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = self.image.get_pixel_mut(x as u32, y as u32);
                blend_pixel(&mut px.0, color);
            }
        }
    }

    /// Scanline fill of a simple or self-intersecting polygon, rows in parallel.
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba) {
        if points.len() < 3 || color[3] == 0 {
            return;
        }
        let width = i64::from(self.width());
        let height = self.height() as usize;
        let (min_y, max_y) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        let first = (min_y - 0.5).ceil().max(0.0) as usize;
        let last = ((max_y - 0.5).floor().max(-1.0) as i64 + 1).min(height as i64) as usize;
        if first >= last {
            return;
        }

        let stride = self.width() as usize * 4;
        self.image
            .par_chunks_mut(stride)
            .enumerate()
            .skip(first)
            .take(last - first)
            .for_each(|(y, row)| {
                let mut spans = Vec::new();
                polygon_spans(points, y as f64 + 0.5, &mut spans);
                for &(start, end) in &spans {
                    let start = start.max(0);
                    let end = end.min(width - 1);
                    for x in start..=end {
                        let i = x as usize * 4;
                        blend_pixel(&mut row[i..i + 4], color);
                    }
                }
            });
    }

    /// Straight-alpha Lanczos3 reduction by an integer factor. Colour is
    /// premultiplied during filtering so transparent texels do not darken edges.
    pub fn downsample(self, factor: u32) -> Canvas {
        if factor <= 1 {
            return self;
        }
        let (w, h) = (self.width() / factor, self.height() / factor);
        let mut premultiplied = self.image;
        premultiplied.par_chunks_mut(4).for_each(|px| {
            let a = u32::from(px[3]);
            for c in 0..3 {
                px[c] = ((u32::from(px[c]) * a + 127) / 255) as u8;
            }
        });
        let mut small = imageops::resize(&premultiplied, w, h, FilterType::Lanczos3);
        drop(premultiplied);
        small.par_chunks_mut(4).for_each(|px| {
            let a = u32::from(px[3]);
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                return;
            }
            for c in 0..3 {
                px[c] = ((u32::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
            }
        });
        Canvas { image: small }
    }

    /// Composite this canvas over `base` (same size) and return the result.
    pub fn composite_onto(&self, mut base: RgbaImage) -> RgbaImage {
        imageops::overlay(&mut base, &self.image, 0, 0);
        base
    }
}

/// Solid-colour image.
pub fn filled(width: u32, height: u32, color: Rgba) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Pixel(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces_destination() {
        let mut dst = [10, 20, 30, 255];
        blend_pixel(&mut dst, [200, 100, 50, 255]);
        assert_eq!(dst, [200, 100, 50, 255]);
    }

    #[test]
    fn blend_onto_transparent_keeps_source_colour() {
        let mut dst = [0, 0, 0, 0];
        blend_pixel(&mut dst, [90, 200, 90, 128]);
        assert_eq!(dst, [90, 200, 90, 128]);
    }

    #[test]
    fn half_alpha_over_opaque_mixes() {
        let mut dst = [0, 0, 0, 255];
        blend_pixel(&mut dst, [255, 255, 255, 128]);
        assert_eq!(dst[3], 255);
        assert!((127..=129).contains(&dst[0]));
    }

    #[test]
    fn polygon_fill_covers_pixel_centres() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_polygon(&[(2.0, 2.0), (6.0, 2.0), (6.0, 5.0), (2.0, 5.0)], [255, 0, 0, 255]);
        let filled: usize = (0..10)
            .flat_map(|y| (0..10).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y)[3] > 0)
            .count();
        assert_eq!(filled, 12);
        assert_eq!(canvas.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(6, 2)[3], 0);
    }

    #[test]
    fn concave_polygon_leaves_notch_empty() {
        let mut canvas = Canvas::new(10, 10);
        // U shape open at the top between x 3..7.
        let u = [
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 6.0),
            (7.0, 6.0),
            (7.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ];
        canvas.fill_polygon(&u, [0, 0, 255, 255]);
        assert_eq!(canvas.pixel(5, 2)[3], 0);
        assert_eq!(canvas.pixel(1, 2)[3], 255);
        assert_eq!(canvas.pixel(5, 8)[3], 255);
    }

    #[test]
    fn polygon_outside_canvas_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_polygon(&[(-10.0, -10.0), (20.0, -10.0), (20.0, 20.0), (-10.0, 20.0)], [1, 2, 3, 255]);
        assert!(canvas.image().pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn downsample_keeps_flat_colour() {
        let canvas = Canvas::from_image(filled(32, 32, [120, 60, 30, 255]));
        let small = canvas.downsample(4);
        assert_eq!((small.width(), small.height()), (8, 8));
        let p = small.pixel(4, 4);
        for c in 0..3 {
            assert!((i32::from(p[c]) - i32::from([120, 60, 30][c])).abs() <= 1);
        }
    }

    #[test]
    fn composite_keeps_base_under_transparent_overlay() {
        let overlay = Canvas::new(4, 4);
        let out = overlay.composite_onto(filled(4, 4, [9, 9, 9, 255]));
        assert!(out.pixels().all(|p| p.0 == [9, 9, 9, 255]));
    }
}
