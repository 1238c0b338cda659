/// Mip chain construction with a parallel box filter.
use crate::error::EncodingInvariantError;
use image::RgbaImage;
use map_constants::texture::{BLOCK_DIMENSION, MIN_MIP_DIMENSION};
use rayon::prelude::*;

/// Level dimensions from `width` x `height` down to 4x4. Each step halves
/// both edges, never going below the minimum.
pub fn mip_dimensions(width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut dims = vec![(width, height)];
    let (mut w, mut h) = (width, height);
    while w > MIN_MIP_DIMENSION || h > MIN_MIP_DIMENSION {
        w = (w / 2).max(MIN_MIP_DIMENSION);
        h = (h / 2).max(MIN_MIP_DIMENSION);
        dims.push((w, h));
    }
    dims
}

pub fn check_alignment(level: usize, width: u32, height: u32) -> Result<(), EncodingInvariantError> {
    if width == 0 || height == 0 || width % BLOCK_DIMENSION != 0 || height % BLOCK_DIMENSION != 0 {
        return Err(EncodingInvariantError::UnalignedLevel { level, width, height });
    }
    Ok(())
}

/// Average each `fx` x `fy` source cell into one destination pixel.
fn box_reduce(src: &RgbaImage, width: u32, height: u32) -> Vec<u8> {
    let fx = src.width() / width;
    let fy = src.height() / height;
    let count = fx * fy;
    let mut out = vec![0u8; (width * height * 4) as usize];
    out.par_chunks_mut((width * 4) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let mut sum = [0u32; 4];
                for sy in y * fy..(y + 1) * fy {
                    for sx in x * fx..(x + 1) * fx {
                        let p = src.get_pixel(sx, sy).0;
                        for c in 0..4 {
                            sum[c] += u32::from(p[c]);
                        }
                    }
                }
                let dst = &mut row[(x * 4) as usize..(x * 4 + 4) as usize];
                for c in 0..4 {
                    dst[c] = ((sum[c] + count / 2) / count) as u8;
                }
            }
        });
    out
}

/// Full chain starting with `top` itself. Every level is checked against
/// the expected dimensions and 4-pixel alignment.
pub fn build_mip_chain(top: RgbaImage) -> Result<Vec<RgbaImage>, EncodingInvariantError> {
    check_alignment(0, top.width(), top.height())?;
    let dims = mip_dimensions(top.width(), top.height());
    let mut levels = Vec::with_capacity(dims.len());
    levels.push(top);

    for (level, &(width, height)) in dims.iter().enumerate().skip(1) {
        check_alignment(level, width, height)?;
        let Some(prev) = levels.last() else {
            break;
        };
        let data = box_reduce(prev, width, height);
        let next = RgbaImage::from_raw(width, height, data).ok_or(
            EncodingInvariantError::LevelDimensions {
                level,
                width: prev.width() / 2,
                height: prev.height() / 2,
                expected_width: width,
                expected_height: height,
            },
        )?;
        levels.push(next);
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn square_chain_ends_at_four() {
        let dims = mip_dimensions(64, 64);
        assert_eq!(dims, vec![(64, 64), (32, 32), (16, 16), (8, 8), (4, 4)]);
        assert_eq!(mip_dimensions(8192, 8192).len(), 12);
    }

    #[test]
    fn rectangular_chain_clamps_short_edge() {
        assert_eq!(
            mip_dimensions(32, 8),
            vec![(32, 8), (16, 4), (8, 4), (4, 4)]
        );
    }

    #[test]
    fn unaligned_top_level_is_rejected() {
        let err = build_mip_chain(RgbaImage::new(6, 6)).unwrap_err();
        assert!(matches!(err, EncodingInvariantError::UnalignedLevel { level: 0, .. }));
    }

    #[test]
    fn box_filter_averages_quads() {
        let mut top = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        for y in 0..2 {
            for x in 0..2 {
                if (x + y) % 2 == 0 {
                    top.put_pixel(x, y, Rgba([200, 100, 40, 255]));
                }
            }
        }
        let chain = build_mip_chain(top).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].dimensions(), (4, 4));
        assert_eq!(chain[1].get_pixel(0, 0).0, [100, 50, 20, 255]);
        assert_eq!(chain[1].get_pixel(3, 3).0, [0, 0, 0, 255]);
    }
}
