//! Map overlay generation for layered game plugins.
//!
//! Plugins are indexed into a [`plugin::RecordStore`], map markers are
//! extracted and merged with collectible tables, projected onto the map
//! canvas, decluttered, drawn over the base image and finally encoded as a
//! mipmapped DXT1 DDS texture.

pub mod bounds;
pub mod classify;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod manifest;
pub mod markers;
pub mod pipeline;
pub mod plugin;
pub mod render;
pub mod report;
pub mod texture;

pub use config::MapConfig;
pub use error::PipelineError;
pub use pipeline::{MapOverlayGenerator, generate};
pub use report::RunReport;
