//! BC1 (DXT1) block compression.
//!
//! Each 4x4 tile becomes two RGB565 endpoints followed by sixteen 2-bit
//! palette indices, pixel `i` (row-major) at bits `2i` of a little-endian
//! `u32`. The encoder always emits `c0 > c1` (four-colour mode) unless both
//! endpoints quantise to the same value, in which case every index is 0.

use crate::error::EncodingInvariantError;
use image::{Rgba, RgbaImage};
use map_constants::texture::{BLOCK_BYTES, BLOCK_DIMENSION};
use rayon::prelude::*;

pub type Block = [u8; BLOCK_BYTES];

/// Sixteen RGBA texels in row-major order.
pub type Tile = [[u8; 4]; 16];

pub fn pack_565(rgb: [u8; 3]) -> u16 {
    let r = (u16::from(rgb[0]) * 31 + 127) / 255;
    let g = (u16::from(rgb[1]) * 63 + 127) / 255;
    let b = (u16::from(rgb[2]) * 31 + 127) / 255;
    (r << 11) | (g << 5) | b
}

/// Expand by bit replication so 0 and full scale map exactly.
pub fn unpack_565(value: u16) -> [u8; 3] {
    let r = ((value >> 11) & 0x1F) as u8;
    let g = ((value >> 5) & 0x3F) as u8;
    let b = (value & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn palette(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let a = unpack_565(c0);
    let b = unpack_565(c1);
    let mix = |w0: u16, w1: u16, d: u16| -> [u8; 4] {
        let mut out = [0, 0, 0, 255];
        for c in 0..3 {
            out[c] = ((w0 * u16::from(a[c]) + w1 * u16::from(b[c]) + d / 2) / d) as u8;
        }
        out
    };
    if c0 > c1 {
        [
            [a[0], a[1], a[2], 255],
            [b[0], b[1], b[2], 255],
            mix(2, 1, 3),
            mix(1, 2, 3),
        ]
    } else {
        [
            [a[0], a[1], a[2], 255],
            [b[0], b[1], b[2], 255],
            mix(1, 1, 2),
            [0, 0, 0, 0],
        ]
    }
}

fn distance_sq(p: [u8; 4], q: [u8; 4]) -> i32 {
    (0..3)
        .map(|c| {
            let d = i32::from(p[c]) - i32::from(q[c]);
            d * d
        })
        .sum()
}

/// Dominant colour direction of the tile by power iteration on the RGB
/// covariance. `None` when every channel is flat.
fn principal_axis(tile: &Tile) -> Option<[f32; 3]> {
    let mut mean = [0f32; 3];
    for p in tile {
        for c in 0..3 {
            mean[c] += f32::from(p[c]);
        }
    }
    mean.iter_mut().for_each(|m| *m /= 16.0);

    let mut cov = [[0f32; 3]; 3];
    for p in tile {
        let d = [
            f32::from(p[0]) - mean[0],
            f32::from(p[1]) - mean[1],
            f32::from(p[2]) - mean[2],
        ];
        for i in 0..3 {
            for j in 0..3 {
                cov[i][j] += d[i] * d[j];
            }
        }
    }

    // Seed from the covariance column of the widest channel.
    let widest = (0..3)
        .max_by(|&a, &b| cov[a][a].total_cmp(&cov[b][b]))
        .unwrap_or(0);
    if cov[widest][widest] < 1e-3 {
        return None;
    }
    let mut axis = [cov[0][widest], cov[1][widest], cov[2][widest]];
    for _ in 0..8 {
        let next = [
            cov[0][0] * axis[0] + cov[0][1] * axis[1] + cov[0][2] * axis[2],
            cov[1][0] * axis[0] + cov[1][1] * axis[1] + cov[1][2] * axis[2],
            cov[2][0] * axis[0] + cov[2][1] * axis[1] + cov[2][2] * axis[2],
        ];
        let norm = next.iter().fold(0f32, |m, v| m.max(v.abs()));
        if norm < 1e-6 {
            break;
        }
        axis = next.map(|v| v / norm);
    }
    Some(axis)
}

/// Encode one tile. Alpha is ignored.
pub fn encode_block(tile: &Tile) -> Block {
    let (lo, hi) = match principal_axis(tile) {
        Some(axis) => {
            let project =
                |p: &[u8; 4]| (0..3).map(|c| f32::from(p[c]) * axis[c]).sum::<f32>();
            let mut lo = (f32::INFINITY, tile[0]);
            let mut hi = (f32::NEG_INFINITY, tile[0]);
            for p in tile {
                let t = project(p);
                if t < lo.0 {
                    lo = (t, *p);
                }
                if t > hi.0 {
                    hi = (t, *p);
                }
            }
            (lo.1, hi.1)
        }
        None => (tile[0], tile[0]),
    };

    let mut c0 = pack_565([hi[0], hi[1], hi[2]]);
    let mut c1 = pack_565([lo[0], lo[1], lo[2]]);
    if c0 < c1 {
        std::mem::swap(&mut c0, &mut c1);
    }

    let mut indices = 0u32;
    if c0 != c1 {
        let colors = palette(c0, c1);
        for (i, p) in tile.iter().enumerate() {
            let best = (0..4u32)
                .min_by_key(|&k| distance_sq(*p, colors[k as usize]))
                .unwrap_or(0);
            indices |= best << (2 * i);
        }
    }

    let mut block = [0u8; BLOCK_BYTES];
    block[0..2].copy_from_slice(&c0.to_le_bytes());
    block[2..4].copy_from_slice(&c1.to_le_bytes());
    block[4..8].copy_from_slice(&indices.to_le_bytes());
    block
}

pub fn decode_block(block: &Block) -> Tile {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let colors = palette(c0, c1);
    std::array::from_fn(|i| colors[((indices >> (2 * i)) & 0b11) as usize])
}

/// Compress a level whose edges are multiples of 4. Blocks are emitted
/// row-major, each block row encoded in parallel.
pub fn compress_level(image: &RgbaImage, level: usize) -> Result<Vec<u8>, EncodingInvariantError> {
    let (width, height) = image.dimensions();
    if width % BLOCK_DIMENSION != 0 || height % BLOCK_DIMENSION != 0 {
        return Err(EncodingInvariantError::UnalignedLevel { level, width, height });
    }
    let blocks_x = (width / BLOCK_DIMENSION) as usize;
    let blocks_y = (height / BLOCK_DIMENSION) as usize;
    let mut out = vec![0u8; blocks_x * blocks_y * BLOCK_BYTES];
    if out.is_empty() {
        return Ok(out);
    }

    out.par_chunks_mut(blocks_x * BLOCK_BYTES)
        .enumerate()
        .for_each(|(by, row)| {
            for bx in 0..blocks_x {
                let tile: Tile = std::array::from_fn(|i| {
                    let x = bx as u32 * BLOCK_DIMENSION + i as u32 % 4;
                    let y = by as u32 * BLOCK_DIMENSION + i as u32 / 4;
                    image.get_pixel(x, y).0
                });
                row[bx * BLOCK_BYTES..(bx + 1) * BLOCK_BYTES].copy_from_slice(&encode_block(&tile));
            }
        });
    Ok(out)
}

/// Inverse of [`compress_level`], used for previews and verification.
pub fn decompress_level(data: &[u8], width: u32, height: u32) -> RgbaImage {
    let blocks_x = (width / BLOCK_DIMENSION) as usize;
    let mut image = RgbaImage::new(width, height);
    for (n, chunk) in data.chunks_exact(BLOCK_BYTES).enumerate() {
        let mut block = [0u8; BLOCK_BYTES];
        block.copy_from_slice(chunk);
        let (bx, by) = ((n % blocks_x.max(1)) as u32, (n / blocks_x.max(1)) as u32);
        for (i, texel) in decode_block(&block).iter().enumerate() {
            let x = bx * BLOCK_DIMENSION + i as u32 % 4;
            let y = by * BLOCK_DIMENSION + i as u32 / 4;
            if x < width && y < height {
                image.put_pixel(x, y, Rgba(*texel));
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb565_extremes_are_exact() {
        assert_eq!(pack_565([255, 255, 255]), 0xFFFF);
        assert_eq!(pack_565([0, 0, 0]), 0);
        assert_eq!(unpack_565(0xFFFF), [255, 255, 255]);
        assert_eq!(unpack_565(pack_565([255, 0, 0])), [255, 0, 0]);
    }

    #[test]
    fn flat_tile_uses_index_zero() {
        let tile = [[90, 140, 200, 255]; 16];
        let block = encode_block(&tile);
        assert_eq!(block[0..2], block[2..4]);
        assert_eq!(&block[4..8], &[0, 0, 0, 0]);
        for texel in decode_block(&block) {
            for c in 0..3 {
                assert!((i32::from(texel[c]) - i32::from(tile[0][c])).abs() <= 6);
            }
        }
    }

    #[test]
    fn two_colour_tile_is_four_colour_mode_and_exact() {
        let mut tile = [[0, 0, 0, 255]; 16];
        for texel in tile.iter_mut().skip(8) {
            *texel = [255, 255, 255, 255];
        }
        let block = encode_block(&tile);
        let c0 = u16::from_le_bytes([block[0], block[1]]);
        let c1 = u16::from_le_bytes([block[2], block[3]]);
        assert!(c0 > c1);
        assert_eq!(decode_block(&block), tile);
    }

    #[test]
    fn gradient_round_trips_within_tolerance() {
        let image = RgbaImage::from_fn(8, 8, |x, y| {
            let v = (x * 16 + y * 4) as u8;
            Rgba([v, v, v, 255])
        });
        let data = compress_level(&image, 0).unwrap();
        assert_eq!(data.len(), 4 * BLOCK_BYTES);
        let decoded = decompress_level(&data, 8, 8);
        for (a, b) in image.pixels().zip(decoded.pixels()) {
            for c in 0..3 {
                let diff = (i32::from(a.0[c]) - i32::from(b.0[c])).abs();
                assert!(diff <= 24, "{:?} vs {:?}", a.0, b.0);
            }
        }
    }

    fn max_channel_error(image: &RgbaImage) -> i32 {
        let (w, h) = image.dimensions();
        let decoded = decompress_level(&compress_level(image, 0).unwrap(), w, h);
        image
            .pixels()
            .zip(decoded.pixels())
            .flat_map(|(a, b)| (0..3).map(move |c| (i32::from(a.0[c]) - i32::from(b.0[c])).abs()))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn hue_split_keeps_both_colours() {
        for (a, b) in [
            ([255, 0, 0, 255], [0, 255, 0, 255]),
            ([0, 0, 255, 255], [255, 255, 0, 255]),
            ([0, 255, 255, 255], [255, 0, 255, 255]),
        ] {
            let tile: Tile = std::array::from_fn(|i| if i % 2 == 0 { a } else { b });
            let decoded = decode_block(&encode_block(&tile));
            assert_eq!(decoded, tile, "{a:?} / {b:?}");
        }
    }

    #[test]
    fn single_channel_ramps_stay_close() {
        for channel in 0..3 {
            let image = RgbaImage::from_fn(4, 4, |x, y| {
                let mut px = [60, 60, 60, 255];
                px[channel] = ((y * 4 + x) * 17) as u8;
                Rgba(px)
            });
            let err = max_channel_error(&image);
            assert!(err <= 40, "channel {channel} error {err}");
        }
    }

    #[test]
    fn random_two_colour_level_is_near_exact() {
        let mut state = 0x9E37_79B9u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let mut pairs = Vec::new();
        for _ in 0..64 {
            let a = next().to_le_bytes();
            let b = next().to_le_bytes();
            pairs.push(([a[0], a[1], a[2], 255], [b[0], b[1], b[2], 255], next()));
        }
        let image = RgbaImage::from_fn(32, 32, |x, y| {
            let (a, b, mask) = pairs[((y / 4) * 8 + x / 4) as usize];
            let bit = (y % 4) * 4 + x % 4;
            Rgba(if mask >> bit & 1 == 1 { a } else { b })
        });
        let err = max_channel_error(&image);
        assert!(err <= 8, "worst channel error {err}");
    }

    #[test]
    fn unaligned_level_is_rejected() {
        let err = compress_level(&RgbaImage::new(6, 4), 2).unwrap_err();
        assert_eq!(
            err,
            EncodingInvariantError::UnalignedLevel {
                level: 2,
                width: 6,
                height: 4
            }
        );
    }
}
