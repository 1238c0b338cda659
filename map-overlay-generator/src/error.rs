/// Error taxonomy for the overlay pipeline.
use crate::coordinates::PixelCoord;
use crate::plugin::form_id::{RawFormId, RecordIdentifier};
use std::path::PathBuf;
use thiserror::Error;

/// Corrupt, truncated or unsupported plugin data. Fatal for one file only.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("bad magic {found:?} (expected TES4)")]
    BadMagic { found: String },

    #[error("{what} at offset {offset} needs {needed} bytes but only {available} remain")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("group at offset {offset} declares size {size}, smaller than its header")]
    GroupTooSmall { offset: usize, size: u32 },

    #[error("group at offset {offset} runs past its parent group ending at {parent_end}")]
    GroupOverrun { offset: usize, parent_end: usize },

    #[error("header record has no usable HEDR field")]
    MissingHedr,

    #[error("sub-field {field} at offset {offset} is malformed: {reason}")]
    BadField {
        field: String,
        offset: usize,
        reason: &'static str,
    },

    #[error("load order is full ({limit} data files)")]
    TooManyFiles { limit: usize },

    #[error("record at offset {offset} failed to decompress: {reason}")]
    Decompress { offset: usize, reason: String },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A cross-file reference that does not lead to a loaded record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("reference {raw} uses master slot {slot} but the file lists {masters} masters")]
    UnknownMasterSlot {
        raw: RawFormId,
        slot: u8,
        masters: usize,
    },

    #[error("reference {raw} points into master {master}, which is not loaded")]
    MasterNotLoaded { raw: RawFormId, master: String },

    #[error("record {id} is not defined by any loaded file")]
    NotFound { id: RecordIdentifier },
}

/// A world position outside the configured bounds; the pixel is already clamped.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("world position ({x}, {y}) lies outside the map bounds, clamped to {clamped}")]
pub struct BoundsError {
    pub x: f64,
    pub y: f64,
    pub clamped: PixelCoord,
}

/// Texture invariants that only a defect in this crate can violate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingInvariantError {
    #[error("mip level {level} is {width}x{height}, not a multiple of 4")]
    UnalignedLevel { level: usize, width: u32, height: u32 },

    #[error("mip level {level} produced {actual} blocks, expected {expected}")]
    BlockCount {
        level: usize,
        expected: usize,
        actual: usize,
    },

    #[error("mip level {level} is {width}x{height}, expected {expected_width}x{expected_height}")]
    LevelDimensions {
        level: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("container is {actual} bytes, expected {expected}")]
    ContainerLength { expected: usize, actual: usize },

    #[error("container header rejected: {0}")]
    Header(String),
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file {path} is not valid JSON: {source}")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("base image {path}: {source}")]
    BaseImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image output failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("manifest serialisation failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingInvariantError),
}
