//! Fixed tables shared by the map overlay tooling: world framing, texture sizing,
//! palette and icon metrics, marker classification tables and record-format tags.

pub mod class;
pub mod coordinate_system;
pub mod record_format;
pub mod render_settings;
pub mod texture;
pub mod threat_zones;
