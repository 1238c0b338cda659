/// Final map texture resolution (square, power of two).
pub const CANVAS_SIZE: u32 = 8192;

/// Linear supersample factor for overlay drawing.
pub const SUPERSAMPLE: u32 = 4;

/// Smallest mip level edge; the chain stops at 4x4.
pub const MIN_MIP_DIMENSION: u32 = 4;

/// Edge length of the 4x4 tiles encoded by the block compressor.
pub const BLOCK_DIMENSION: u32 = 4;

/// Bytes per compressed 4x4 tile.
pub const BLOCK_BYTES: usize = 8;

/// Magic plus the 124-byte DDS header.
pub const DDS_HEADER_LEN: usize = 128;

/// Edge length of the optional PNG preview.
pub const PREVIEW_SIZE: u32 = 2048;

/// Fill used when no base satellite image is supplied.
pub const BACKGROUND: [u8; 4] = [20, 22, 18, 255];
