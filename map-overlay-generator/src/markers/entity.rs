/// Marker entities shared by every stage after extraction.
use crate::plugin::RecordIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a location marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationCategory {
    Settlement,
    Vault,
    Military,
    Metro,
    City,
    Police,
    Poi,
    Other,
}

impl LocationCategory {
    pub const ALL: [LocationCategory; 8] = [
        LocationCategory::Settlement,
        LocationCategory::Vault,
        LocationCategory::Military,
        LocationCategory::Metro,
        LocationCategory::City,
        LocationCategory::Police,
        LocationCategory::Poi,
        LocationCategory::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LocationCategory::Settlement => "settlement",
            LocationCategory::Vault => "vault",
            LocationCategory::Military => "military",
            LocationCategory::Metro => "metro",
            LocationCategory::City => "city",
            LocationCategory::Police => "police",
            LocationCategory::Poi => "poi",
            LocationCategory::Other => "other",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Kind of a tabular collectible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Bobblehead,
    Magazine,
    PowerArmor,
    FusionCore,
    Trader,
}

impl CollectibleKind {
    pub const ALL: [CollectibleKind; 5] = [
        CollectibleKind::Bobblehead,
        CollectibleKind::Magazine,
        CollectibleKind::PowerArmor,
        CollectibleKind::FusionCore,
        CollectibleKind::Trader,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CollectibleKind::Bobblehead => "bobblehead",
            CollectibleKind::Magazine => "magazine",
            CollectibleKind::PowerArmor => "power_armor",
            CollectibleKind::FusionCore => "fusion_core",
            CollectibleKind::Trader => "trader",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Location(LocationCategory),
    Collectible(CollectibleKind),
}

impl Category {
    pub fn key(self) -> &'static str {
        match self {
            Category::Location(c) => c.key(),
            Category::Collectible(c) => c.key(),
        }
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Category::Collectible(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a marker came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MarkerOrigin {
    Plugin { file: String },
    Collectible { source: String },
}

impl MarkerOrigin {
    pub fn source_name(&self) -> &str {
        match self {
            MarkerOrigin::Plugin { file } => file,
            MarkerOrigin::Collectible { source } => source,
        }
    }
}

/// A world-placed marker. Never mutated after extraction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerEntity {
    pub id: RecordIdentifier,
    pub name: String,
    /// World-space x, y, z.
    pub position: [f64; 3],
    /// Raw map-marker type code, when the record carries one.
    pub type_code: Option<u16>,
    pub category: Category,
    pub origin: MarkerOrigin,
    /// Free-text location note from tabular input.
    pub location: Option<String>,
}

impl MarkerEntity {
    pub fn x(&self) -> f64 {
        self.position[0]
    }

    pub fn y(&self) -> f64 {
        self.position[1]
    }

    pub fn world_distance(&self, other: &MarkerEntity) -> f64 {
        (self.x() - other.x()).hypot(self.y() - other.y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_round_trip() {
        for c in LocationCategory::ALL {
            assert_eq!(LocationCategory::from_key(c.key()), Some(c));
        }
        for k in CollectibleKind::ALL {
            assert_eq!(CollectibleKind::from_key(k.key()), Some(k));
        }
    }

    #[test]
    fn collectible_keys_accept_loose_spelling() {
        assert_eq!(CollectibleKind::from_key("Power Armor"), Some(CollectibleKind::PowerArmor));
        assert_eq!(CollectibleKind::from_key("fusion-core"), Some(CollectibleKind::FusionCore));
        assert_eq!(CollectibleKind::from_key("nuka_cola"), None);
    }
}
