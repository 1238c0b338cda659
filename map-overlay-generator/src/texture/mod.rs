//! Final texture encoding: mip chain, BC1 blocks and the DDS container.

pub mod bc1;
pub mod dds_writer;
pub mod mipmap;

use crate::error::EncodingInvariantError;
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

/// One compressed mip level.
#[derive(Debug, Clone)]
pub struct EncodedLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A validated DXT1 container ready to be written.
#[derive(Debug, Clone)]
pub struct EncodedTexture {
    pub width: u32,
    pub height: u32,
    pub mip_levels: usize,
    pub bytes: Vec<u8>,
}

impl EncodedTexture {
    pub fn info(&self) -> TextureInfo {
        TextureInfo {
            width: self.width,
            height: self.height,
            mip_levels: self.mip_levels,
            format: "DXT1",
            byte_size: self.bytes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub mip_levels: usize,
    pub format: &'static str,
    pub byte_size: usize,
}

/// Build the mip chain for `image`, compress every level and assemble the
/// container. Consumes the image so the chain can reuse its buffer.
pub fn encode_dxt1(image: RgbaImage) -> Result<EncodedTexture, EncodingInvariantError> {
    let (width, height) = image.dimensions();
    let chain = mipmap::build_mip_chain(image)?;
    info!(width, height, levels = chain.len(), "Built mip chain");

    let progress = ProgressBar::new(chain.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} mip levels {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    progress.set_message("Compressing");

    let mut levels = Vec::with_capacity(chain.len());
    for (index, level) in chain.iter().enumerate() {
        levels.push(EncodedLevel {
            width: level.width(),
            height: level.height(),
            data: bc1::compress_level(level, index)?,
        });
        progress.inc(1);
    }
    drop(chain);
    progress.finish_with_message("Compressed");

    let bytes = dds_writer::build_dxt1_container(&levels)?;
    info!(bytes = bytes.len(), "DXT1 container validated");
    Ok(EncodedTexture {
        width,
        height,
        mip_levels: levels.len(),
        bytes,
    })
}
