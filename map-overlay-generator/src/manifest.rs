/// Run manifest describing the generated texture and how it was produced.
use crate::bounds::WorldBounds;
use crate::classify::Layout;
use crate::config::MapConfig;
use crate::error::PipelineError;
use crate::plugin::{DataFile, RecordStore};
use crate::report::RunReport;
use crate::texture::TextureInfo;
use map_constants::record_format::FLAG_MASTER;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One loaded plugin as it contributed to the run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PluginSummary {
    pub name: String,
    pub load_index: u8,
    pub version: f32,
    pub author: Option<String>,
    pub masters: Vec<String>,
    pub master_flag: bool,
    pub localized: bool,
    pub records: usize,
    pub groups: usize,
}

impl PluginSummary {
    pub fn from_file(file: &DataFile) -> Self {
        let header = file.header();
        Self {
            name: file.name().to_string(),
            load_index: file.index().0,
            version: header.version,
            author: header.author.clone(),
            masters: header.masters.clone(),
            master_flag: header.flags & FLAG_MASTER != 0,
            localized: header.is_localized(),
            records: file.records().len(),
            groups: file.group_count(),
        }
    }
}

/// How collectibles were folded onto location markers.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GroupingStats {
    pub threshold: f64,
    pub dedup_radius_px: f64,
    pub locations: usize,
    pub hosts_with_collectibles: usize,
    pub collectibles_folded: usize,
    pub collectibles_standalone: usize,
    pub duplicates_dropped: usize,
}

#[derive(Serialize, Debug)]
pub struct OverlayManifest {
    pub texture_file: String,
    pub preview_file: Option<String>,
    pub texture: TextureInfo,
    pub world: WorldBounds,
    /// Extent of every drawn marker, absent when nothing was drawn.
    pub marker_extent: Option<WorldBounds>,
    pub plugins: Vec<PluginSummary>,
    pub categories: BTreeMap<&'static str, usize>,
    pub grouping: GroupingStats,
    pub report: RunReport,
}

impl OverlayManifest {
    pub fn new(
        config: &MapConfig,
        store: &RecordStore,
        layout: &Layout,
        texture: TextureInfo,
        report: &RunReport,
    ) -> Self {
        let mut extent = WorldBounds::empty();
        for marker in layout.locations.iter().chain(&layout.standalone) {
            extent.update(marker.entity.x(), marker.entity.y());
        }

        Self {
            texture_file: String::new(),
            preview_file: None,
            texture,
            world: config.world,
            marker_extent: (!extent.is_empty()).then_some(extent),
            plugins: store.files().iter().map(PluginSummary::from_file).collect(),
            categories: layout.category_counts(),
            grouping: GroupingStats {
                threshold: config.group_threshold,
                dedup_radius_px: config.dedup_radius_px,
                locations: layout.locations.len(),
                hosts_with_collectibles: layout.hosts_with_collectibles(),
                collectibles_folded: layout.assignments.len(),
                collectibles_standalone: layout.standalone.len(),
                duplicates_dropped: layout.duplicates_dropped,
            },
            report: report.clone(),
        }
    }

    pub fn with_outputs(mut self, texture: &Path, preview: Option<&Path>) -> Self {
        self.texture_file = texture.display().to_string();
        self.preview_file = preview.map(|p| p.display().to_string());
        self
    }
}

/// Writes the manifest as pretty JSON and logs a short summary.
pub struct ManifestGenerator {
    path: PathBuf,
}

impl ManifestGenerator {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn write(&self, manifest: &OverlayManifest) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(&self.path, json).map_err(|source| PipelineError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Generated manifest");
        self.log_summary(manifest);
        Ok(())
    }

    fn log_summary(&self, manifest: &OverlayManifest) {
        info!(
            plugins = manifest.plugins.len(),
            locations = manifest.grouping.locations,
            folded = manifest.grouping.collectibles_folded,
            standalone = manifest.grouping.collectibles_standalone,
            "Manifest summary"
        );
        info!(
            width = manifest.texture.width,
            height = manifest.texture.height,
            mips = manifest.texture.mip_levels,
            bytes = manifest.texture.byte_size,
            "Texture {}",
            manifest.texture.format
        );
        for (category, count) in &manifest.categories {
            info!("  {category}: {count}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginSource;
    use crate::plugin::builder::PluginBuilder;

    fn texture_info() -> TextureInfo {
        TextureInfo {
            width: 64,
            height: 64,
            mip_levels: 5,
            format: "DXT1",
            byte_size: 2856,
        }
    }

    #[test]
    fn summarises_plugins_and_layout() {
        let bytes = PluginBuilder::default().author("tester").build();
        let mut report = RunReport::new();
        let store = RecordStore::from_sources(vec![PluginSource::new("A.esm", bytes)], &mut report);
        let config = MapConfig::default();

        let manifest = OverlayManifest::new(&config, &store, &Layout::default(), texture_info(), &report)
            .with_outputs(Path::new("out/map.dds"), None);
        assert_eq!(manifest.plugins.len(), 1);
        assert_eq!(manifest.plugins[0].name, "A.esm");
        assert_eq!(manifest.plugins[0].author.as_deref(), Some("tester"));
        assert!(manifest.marker_extent.is_none());
        assert_eq!(manifest.texture_file, "out/map.dds");
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut report = RunReport::new();
        let store = RecordStore::from_sources(Vec::new(), &mut report);
        let manifest = OverlayManifest::new(
            &MapConfig::default(),
            &store,
            &Layout::default(),
            texture_info(),
            &report,
        );
        ManifestGenerator::new(&path).write(&manifest).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["texture"]["format"], "DXT1");
        assert_eq!(value["texture"]["mip_levels"], 5);
        assert_eq!(value["grouping"]["threshold"], 9300.0);
    }
}
