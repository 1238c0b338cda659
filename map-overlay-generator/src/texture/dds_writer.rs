/// DXT1 DDS container assembly, validation and atomic output.
use crate::error::{EncodingInvariantError, PipelineError};
use crate::texture::EncodedLevel;
use crate::texture::mipmap::{check_alignment, mip_dimensions};
use ddsfile::{Caps, D3DFormat, Dds, HeaderFlags, NewD3dParams};
use map_constants::texture::{BLOCK_BYTES, BLOCK_DIMENSION, DDS_HEADER_LEN};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const DDS_MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;
const PF_FOURCC: u32 = 0x4;

/// Compressed byte size of one level.
pub fn level_len(width: u32, height: u32) -> usize {
    (width / BLOCK_DIMENSION) as usize * (height / BLOCK_DIMENSION) as usize * BLOCK_BYTES
}

/// Exact file size of a full-chain DXT1 container for a `width` x `height` top level.
pub fn expected_container_len(width: u32, height: u32) -> usize {
    DDS_HEADER_LEN
        + mip_dimensions(width, height)
            .into_iter()
            .map(|(w, h)| level_len(w, h))
            .sum::<usize>()
}

fn header_flags(levels: usize) -> HeaderFlags {
    let mut flags = HeaderFlags::CAPS
        | HeaderFlags::HEIGHT
        | HeaderFlags::WIDTH
        | HeaderFlags::PIXELFORMAT
        | HeaderFlags::LINEARSIZE;
    if levels > 1 {
        flags |= HeaderFlags::MIPMAPCOUNT;
    }
    flags
}

fn caps(levels: usize) -> Caps {
    if levels > 1 {
        Caps::TEXTURE | Caps::MIPMAP | Caps::COMPLEX
    } else {
        Caps::TEXTURE
    }
}

/// Check the chain against the dimensions it must have and the block count
/// each level must carry.
fn check_levels(levels: &[EncodedLevel]) -> Result<(u32, u32), EncodingInvariantError> {
    let Some(top) = levels.first() else {
        return Err(EncodingInvariantError::Header("no mip levels to encode".into()));
    };
    let dims = mip_dimensions(top.width, top.height);
    if dims.len() != levels.len() {
        return Err(EncodingInvariantError::Header(format!(
            "chain has {} levels, expected {}",
            levels.len(),
            dims.len()
        )));
    }
    for (index, (level, &(w, h))) in levels.iter().zip(&dims).enumerate() {
        check_alignment(index, level.width, level.height)?;
        if (level.width, level.height) != (w, h) {
            return Err(EncodingInvariantError::LevelDimensions {
                level: index,
                width: level.width,
                height: level.height,
                expected_width: w,
                expected_height: h,
            });
        }
        let expected = level_len(w, h) / BLOCK_BYTES;
        let actual = level.data.len() / BLOCK_BYTES;
        if level.data.len() % BLOCK_BYTES != 0 || actual != expected {
            return Err(EncodingInvariantError::BlockCount {
                level: index,
                expected,
                actual,
            });
        }
    }
    Ok((top.width, top.height))
}

/// Assemble the container in memory and verify the bytes a loader will read.
pub fn build_dxt1_container(levels: &[EncodedLevel]) -> Result<Vec<u8>, EncodingInvariantError> {
    let (width, height) = check_levels(levels)?;
    let count = levels.len();

    let params = NewD3dParams {
        height,
        width,
        depth: None,
        format: D3DFormat::DXT1,
        mipmap_levels: Some(count as u32),
        caps2: None,
    };
    let mut dds =
        Dds::new_d3d(params).map_err(|e| EncodingInvariantError::Header(e.to_string()))?;
    dds.header.caps = caps(count);
    dds.header.pitch = None;
    dds.header.linear_size = Some(level_len(width, height) as u32);
    dds.header.depth = None;
    dds.header.mip_map_count = (count > 1).then_some(count as u32);

    let total: usize = levels.iter().map(|l| l.data.len()).sum();
    let mut data = Vec::with_capacity(total);
    for level in levels {
        data.extend_from_slice(&level.data);
    }
    dds.data = data;

    let mut bytes = Vec::with_capacity(DDS_HEADER_LEN + total);
    dds.write(&mut bytes)
        .map_err(|e| EncodingInvariantError::Header(e.to_string()))?;
    validate_container(&bytes, width, height, count)?;
    Ok(bytes)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    bytes
        .get(offset..offset + 4)
        .map_or(0, |b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Byte-level check of a DXT1 container header and total length.
pub fn validate_container(
    bytes: &[u8],
    width: u32,
    height: u32,
    levels: usize,
) -> Result<(), EncodingInvariantError> {
    let expected = expected_container_len(width, height);
    if bytes.len() != expected {
        return Err(EncodingInvariantError::ContainerLength {
            expected,
            actual: bytes.len(),
        });
    }
    let fail = |what: String| Err(EncodingInvariantError::Header(what));

    if &bytes[0..4] != DDS_MAGIC {
        return fail("missing DDS magic".into());
    }
    let field = |offset: usize| read_u32(bytes, 4 + offset);
    if field(0) != HEADER_SIZE {
        return fail(format!("header size {} != {HEADER_SIZE}", field(0)));
    }
    if field(4) != header_flags(levels).bits() {
        return fail(format!("header flags {:#x}", field(4)));
    }
    if (field(12), field(8)) != (width, height) {
        return fail(format!("dimensions {}x{}", field(12), field(8)));
    }
    if field(16) as usize != level_len(width, height) {
        return fail(format!("linear size {}", field(16)));
    }
    let mip_count = if levels > 1 { levels as u32 } else { 0 };
    if field(24) != mip_count {
        return fail(format!("mip count {} != {mip_count}", field(24)));
    }
    if field(72) != PIXEL_FORMAT_SIZE {
        return fail(format!("pixel format size {}", field(72)));
    }
    if field(76) & PF_FOURCC == 0 {
        return fail("pixel format lacks FOURCC flag".into());
    }
    if &bytes[4 + 80..4 + 84] != b"DXT1" {
        return fail("pixel format is not DXT1".into());
    }
    if field(104) != caps(levels).bits() {
        return fail(format!("caps {:#x}", field(104)));
    }
    Ok(())
}

/// Write through a sibling temporary file so a failed run never leaves a
/// partial texture behind.
pub fn write_dds(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let write_err = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    let tmp = path.with_extension("dds.tmp");
    let mut file = fs::File::create(&tmp).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    fs::rename(&tmp, path).map_err(write_err)?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote DDS texture");
    Ok(())
}
