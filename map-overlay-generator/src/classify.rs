/// Display styling, cross-source deduplication and collectible grouping.
use crate::config::MapConfig;
use crate::coordinates::{CoordinateMapper, PixelCoord};
use crate::markers::{Category, CollectibleKind, LocationCategory, MarkerEntity, MarkerOrigin};
use crate::plugin::RecordIdentifier;
use crate::report::{IssueKind, RunReport};
use map_constants::render_settings::{
    FONT_MAJOR_PX, FONT_REGULAR_PX, ICON_WHITE, Rgba, WHITE_DIM, get_category_style,
    get_collectible_style,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Procedural icon silhouettes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconShape {
    Pennant,
    VaultRing,
    BoxedCross,
    MetroRing,
    Skyline,
    SixPointStar,
    PoiRing,
    Chevron,
    FourPointStar,
    Page,
    Shield,
    Dot,
    Diamond,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LabelStyle {
    pub color: Rgba,
    /// Glyph height in final pixels.
    pub font_px: u32,
    /// Lower labels are placed first.
    pub priority: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DisplayStyle {
    pub shape: IconShape,
    /// Icon edge in final pixels.
    pub icon_size: u32,
    pub color: Rgba,
    pub label: Option<LabelStyle>,
}

impl DisplayStyle {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Location(c) => Self::for_location(c),
            Category::Collectible(k) => Self::for_collectible(k),
        }
    }

    pub fn for_location(category: LocationCategory) -> Self {
        let shape = match category {
            LocationCategory::Settlement => IconShape::Pennant,
            LocationCategory::Vault => IconShape::VaultRing,
            LocationCategory::Military => IconShape::BoxedCross,
            LocationCategory::Metro => IconShape::MetroRing,
            LocationCategory::City => IconShape::Skyline,
            LocationCategory::Police => IconShape::SixPointStar,
            LocationCategory::Poi => IconShape::PoiRing,
            LocationCategory::Other => IconShape::Chevron,
        };
        match get_category_style(category.key()) {
            Some(style) => Self {
                shape,
                icon_size: style.icon_size,
                color: ICON_WHITE,
                label: style.label_priority.map(|priority| LabelStyle {
                    color: style.label_color,
                    font_px: if style.major { FONT_MAJOR_PX } else { FONT_REGULAR_PX },
                    priority,
                }),
            },
            None => Self {
                shape,
                icon_size: 14,
                color: ICON_WHITE,
                label: Some(LabelStyle {
                    color: WHITE_DIM,
                    font_px: FONT_REGULAR_PX,
                    priority: 50,
                }),
            },
        }
    }

    pub fn for_collectible(kind: CollectibleKind) -> Self {
        let shape = match kind {
            CollectibleKind::Bobblehead => IconShape::FourPointStar,
            CollectibleKind::Magazine => IconShape::Page,
            CollectibleKind::PowerArmor => IconShape::Shield,
            CollectibleKind::FusionCore => IconShape::Dot,
            CollectibleKind::Trader => IconShape::Diamond,
        };
        let (icon_size, color) = get_collectible_style(kind.key())
            .map_or((10, [200, 200, 200, 255]), |s| (s.icon_size, s.color));
        Self {
            shape,
            icon_size,
            color,
            label: None,
        }
    }
}

/// A marker placed on the canvas.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectedMarker {
    pub entity: MarkerEntity,
    pub pixel: PixelCoord,
    pub display: Category,
    pub style: DisplayStyle,
    /// Collectibles folded into this marker, in collectible order.
    pub folded: Vec<(RecordIdentifier, CollectibleKind)>,
}

impl ProjectedMarker {
    /// Distinct folded kinds, sorted.
    pub fn badge_kinds(&self) -> Vec<CollectibleKind> {
        let mut kinds: Vec<CollectibleKind> = self.folded.iter().map(|(_, k)| *k).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// A collectible folded into a host location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Assignment {
    pub collectible: RecordIdentifier,
    pub host: RecordIdentifier,
    pub distance: f64,
}

/// Everything the renderer draws, in drawing order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Layout {
    pub locations: Vec<ProjectedMarker>,
    pub standalone: Vec<ProjectedMarker>,
    pub assignments: Vec<Assignment>,
    pub duplicates_dropped: usize,
}

impl Layout {
    /// Markers per category, folded collectibles included.
    pub fn category_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.locations {
            *counts.entry(m.display.key()).or_insert(0) += 1;
            for (_, kind) in &m.folded {
                *counts.entry(kind.key()).or_insert(0) += 1;
            }
        }
        for m in &self.standalone {
            *counts.entry(m.display.key()).or_insert(0) += 1;
        }
        counts
    }

    pub fn hosts_with_collectibles(&self) -> usize {
        self.locations.iter().filter(|m| !m.folded.is_empty()).count()
    }
}

pub struct Classifier<'c> {
    config: &'c MapConfig,
    mapper: CoordinateMapper,
}

impl<'c> Classifier<'c> {
    pub fn new(config: &'c MapConfig) -> Self {
        Self {
            config,
            mapper: CoordinateMapper::from_config(config),
        }
    }

    fn project(&self, entity: MarkerEntity, report: &mut RunReport) -> ProjectedMarker {
        let pixel = match self.mapper.project(entity.x(), entity.y()) {
            Ok(p) => p,
            Err(e) => {
                report.record(
                    IssueKind::Bounds,
                    format!("{} {}", entity.origin.source_name(), entity.id),
                    &e,
                );
                e.clamped
            }
        };
        ProjectedMarker {
            display: entity.category,
            style: DisplayStyle::for_category(entity.category),
            pixel,
            entity,
            folded: Vec::new(),
        }
    }

    /// Project, deduplicate and group. Input order is preserved in each output list.
    pub fn layout(&self, entities: Vec<MarkerEntity>, report: &mut RunReport) -> Layout {
        let (collectibles, locations): (Vec<_>, Vec<_>) =
            entities.into_iter().partition(|e| e.category.is_collectible());

        let mut accepted: Vec<ProjectedMarker> = Vec::with_capacity(locations.len());
        let mut duplicates_dropped = 0;
        for entity in locations {
            let marker = self.project(entity, report);
            if self.is_duplicate(&marker, &accepted) {
                duplicates_dropped += 1;
                continue;
            }
            accepted.push(marker);
        }

        let hosts = self.assign_hosts(&collectibles, &accepted);

        let mut standalone = Vec::new();
        let mut assignments = Vec::new();
        for (entity, host) in collectibles.into_iter().zip(hosts) {
            let Category::Collectible(kind) = entity.category else {
                continue;
            };
            match host {
                Some((index, distance)) => {
                    let host = &mut accepted[index];
                    host.folded.push((entity.id, kind));
                    assignments.push(Assignment {
                        collectible: entity.id,
                        host: host.entity.id,
                        distance,
                    });
                }
                None => standalone.push(self.project(entity, report)),
            }
        }

        report.duplicates_dropped = duplicates_dropped;
        report.collectibles_folded = assignments.len();
        report.collectibles_standalone = standalone.len();
        info!(
            locations = accepted.len(),
            duplicates = duplicates_dropped,
            folded = assignments.len(),
            standalone = standalone.len(),
            "Markers classified"
        );

        Layout {
            locations: accepted,
            standalone,
            assignments,
            duplicates_dropped,
        }
    }

    /// A location within the dedup radius of an accepted marker from another plugin.
    fn is_duplicate(&self, marker: &ProjectedMarker, accepted: &[ProjectedMarker]) -> bool {
        let MarkerOrigin::Plugin { file } = &marker.entity.origin else {
            return false;
        };
        accepted.iter().any(|other| {
            matches!(&other.entity.origin, MarkerOrigin::Plugin { file: f } if f != file)
                && marker.pixel.distance(other.pixel) < self.config.dedup_radius_px
        })
    }

    /// Nearest location within the threshold for every collectible. Ties go to the
    /// location with the lowest identifier.
    pub fn assign_hosts(
        &self,
        collectibles: &[MarkerEntity],
        locations: &[ProjectedMarker],
    ) -> Vec<Option<(usize, f64)>> {
        let threshold = self.config.group_threshold;
        collectibles
            .par_iter()
            .map(|item| {
                let mut best: Option<(usize, f64)> = None;
                for (i, loc) in locations.iter().enumerate() {
                    let d = item.world_distance(&loc.entity);
                    if d > threshold {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((j, bd)) => d < bd || (d == bd && loc.entity.id < locations[j].entity.id),
                    };
                    if better {
                        best = Some((i, d));
                    }
                }
                best
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::FileIndex;

    fn location(file: &str, index: u8, local: u32, x: f64, y: f64) -> MarkerEntity {
        MarkerEntity {
            id: RecordIdentifier::new(FileIndex(index), local),
            name: format!("Loc {local}"),
            position: [x, y, 0.0],
            type_code: None,
            category: Category::Location(LocationCategory::Settlement),
            origin: MarkerOrigin::Plugin { file: file.into() },
            location: None,
        }
    }

    fn collectible(ordinal: u32, kind: CollectibleKind, x: f64, y: f64) -> MarkerEntity {
        MarkerEntity {
            id: RecordIdentifier::new(FileIndex::COLLECTIBLES, ordinal),
            name: format!("Item {ordinal}"),
            position: [x, y, 0.0],
            type_code: None,
            category: Category::Collectible(kind),
            origin: MarkerOrigin::Collectible {
                source: "items.csv".into(),
            },
            location: None,
        }
    }

    fn config(threshold: f64) -> MapConfig {
        MapConfig {
            group_threshold: threshold,
            ..MapConfig::default()
        }
    }

    #[test]
    fn folds_near_collectibles_only() {
        let config = config(500.0);
        let classifier = Classifier::new(&config);
        let mut report = RunReport::new();
        let layout = classifier.layout(
            vec![
                location("A.esm", 0, 1, 0.0, 0.0),
                collectible(0, CollectibleKind::Bobblehead, 50.0, 0.0),
                collectible(1, CollectibleKind::Magazine, 5000.0, 0.0),
            ],
            &mut report,
        );
        assert_eq!(layout.locations.len(), 1);
        assert_eq!(layout.locations[0].folded.len(), 1);
        assert_eq!(layout.standalone.len(), 1);
        assert_eq!(layout.standalone[0].entity.name, "Item 1");
        assert_eq!(layout.assignments[0].distance, 50.0);
        assert_eq!(report.collectibles_folded, 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = config(500.0);
        let classifier = Classifier::new(&config);
        let hosts = classifier.assign_hosts(
            &[collectible(0, CollectibleKind::Trader, 500.0, 0.0)],
            &classifier
                .layout(vec![location("A.esm", 0, 1, 0.0, 0.0)], &mut RunReport::new())
                .locations,
        );
        assert_eq!(hosts, vec![Some((0, 500.0))]);
    }

    #[test]
    fn equidistant_tie_goes_to_lowest_identifier() {
        let config = config(500.0);
        let classifier = Classifier::new(&config);
        let mut report = RunReport::new();
        // Higher identifier listed first so input order cannot decide.
        let layout = classifier.layout(
            vec![
                location("A.esm", 0, 9, 100.0, 0.0),
                location("A.esm", 0, 3, -100.0, 0.0),
                collectible(0, CollectibleKind::FusionCore, 0.0, 0.0),
            ],
            &mut report,
        );
        assert_eq!(
            layout.assignments[0].host,
            RecordIdentifier::new(FileIndex(0), 3)
        );
    }

    #[test]
    fn drops_cross_file_duplicates_but_keeps_same_file_neighbours() {
        let config = config(500.0);
        let classifier = Classifier::new(&config);
        let mut report = RunReport::new();
        let layout = classifier.layout(
            vec![
                location("A.esm", 0, 1, 0.0, 0.0),
                location("A.esm", 0, 2, 31.0, 0.0),
                location("B.esp", 1, 1, 62.0, 0.0),
                location("B.esp", 1, 2, 80000.0, 0.0),
            ],
            &mut report,
        );
        assert_eq!(layout.locations.len(), 3);
        assert_eq!(layout.duplicates_dropped, 1);
        assert_eq!(report.duplicates_dropped, 1);
    }

    #[test]
    fn out_of_bounds_marker_is_clamped_and_reported() {
        let config = MapConfig::default();
        let classifier = Classifier::new(&config);
        let mut report = RunReport::new();
        let layout = classifier.layout(vec![location("A.esm", 0, 1, 1.0e7, 0.0)], &mut report);
        assert_eq!(layout.locations[0].pixel.x, 8191);
        assert_eq!(report.count(IssueKind::Bounds), 1);
    }

    #[test]
    fn unlabelled_categories_have_no_label_style() {
        assert!(DisplayStyle::for_location(LocationCategory::Other).label.is_none());
        assert!(DisplayStyle::for_location(LocationCategory::Poi).label.is_none());
        let city = DisplayStyle::for_location(LocationCategory::City);
        assert_eq!(city.label.map(|l| l.priority), Some(0));
        assert_eq!(city.icon_size, 26);
    }
}
