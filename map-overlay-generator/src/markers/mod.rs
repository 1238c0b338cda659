//! Marker entities and the two sources they come from.

pub mod category;
pub mod collectibles;
pub mod entity;
pub mod extract;

pub use collectibles::load_collectibles;
pub use entity::{Category, CollectibleKind, LocationCategory, MarkerEntity, MarkerOrigin};
pub use extract::MarkerExtractor;
