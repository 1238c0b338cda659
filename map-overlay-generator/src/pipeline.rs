/// End-to-end overlay generation: plugins and tables in, DDS texture out.
use crate::classify::{Classifier, Layout};
use crate::config::MapConfig;
use crate::error::PipelineError;
use crate::manifest::{ManifestGenerator, OverlayManifest};
use crate::markers::{MarkerEntity, MarkerExtractor, load_collectibles};
use crate::plugin::RecordStore;
use crate::render::{CanvasRenderer, load_base_image};
use crate::report::RunReport;
use crate::texture::dds_writer::write_dds;
use crate::texture::{EncodedTexture, encode_dxt1};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Result of the in-memory stages, before anything touches disk.
pub struct Generated {
    pub layout: Layout,
    pub texture: EncodedTexture,
    pub preview: Option<RgbaImage>,
}

/// Extract, classify, render and encode. `base` must already be at canvas size.
/// The preview, when requested, is reduced from the composite before encoding.
pub fn generate(
    config: &MapConfig,
    store: &RecordStore,
    collectibles: Vec<MarkerEntity>,
    base: RgbaImage,
    with_preview: bool,
    report: &mut RunReport,
) -> Result<Generated, PipelineError> {
    config.validate()?;
    if base.dimensions() != (config.canvas_size, config.canvas_size) {
        return Err(PipelineError::Config(format!(
            "base image is {}x{}, canvas is {}",
            base.width(),
            base.height(),
            config.canvas_size
        )));
    }

    let mut entities = MarkerExtractor::extract_all(store, report);
    entities.extend(collectibles);
    let layout = Classifier::new(config).layout(entities, report);

    let composite = CanvasRenderer::new(config).render(base, &layout);
    let preview = with_preview.then(|| preview_of(&composite, config.preview_size));
    let texture = encode_dxt1(composite)?;

    Ok(Generated {
        layout,
        texture,
        preview,
    })
}

fn preview_of(composite: &RgbaImage, size: u32) -> RgbaImage {
    if composite.width() == size {
        return composite.clone();
    }
    imageops::resize(composite, size, size, FilterType::Lanczos3)
}

/// File-driven run of the whole pipeline.
pub struct MapOverlayGenerator {
    config: MapConfig,
    plugins: Vec<PathBuf>,
    collectibles: Vec<PathBuf>,
    base: Option<PathBuf>,
    output: PathBuf,
    preview: Option<PathBuf>,
    manifest: Option<PathBuf>,
}

impl MapOverlayGenerator {
    pub fn new(config: MapConfig, plugins: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            config,
            plugins,
            collectibles: Vec::new(),
            base: None,
            output,
            preview: None,
            manifest: None,
        }
    }

    pub fn with_collectibles(mut self, tables: Vec<PathBuf>) -> Self {
        self.collectibles = tables;
        self
    }

    pub fn with_base(mut self, base: Option<PathBuf>) -> Self {
        self.base = base;
        self
    }

    pub fn with_preview(mut self, path: Option<PathBuf>) -> Self {
        self.preview = path;
        self
    }

    pub fn with_manifest(mut self, path: Option<PathBuf>) -> Self {
        self.manifest = path;
        self
    }

    /// Run every stage. Per-file and per-record problems end up in the
    /// returned report; anything else aborts before the texture is written.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        self.config.validate()?;
        if self.plugins.is_empty() {
            return Err(PipelineError::Config("no plugin files given".into()));
        }
        info!(
            plugins = self.plugins.len(),
            tables = self.collectibles.len(),
            size = self.config.canvas_size,
            supersample = self.config.supersample,
            "Generating map overlay"
        );

        let mut report = RunReport::new();
        let store = RecordStore::load(&self.plugins, &mut report);
        let collectibles = load_collectibles(&self.collectibles, &mut report);
        let base = load_base_image(self.base.as_deref(), self.config.canvas_size)?;

        let generated = generate(
            &self.config,
            &store,
            collectibles,
            base,
            self.preview.is_some(),
            &mut report,
        )?;

        ensure_parent(&self.output)?;
        write_dds(&self.output, &generated.texture.bytes)?;

        if let (Some(path), Some(preview)) = (&self.preview, &generated.preview) {
            ensure_parent(path)?;
            preview.save(path)?;
            info!(path = %path.display(), size = preview.width(), "Wrote preview");
        }

        if let Some(path) = &self.manifest {
            ensure_parent(path)?;
            let manifest = OverlayManifest::new(
                &self.config,
                &store,
                &generated.layout,
                generated.texture.info(),
                &report,
            )
            .with_outputs(&self.output, self.preview.as_deref());
            ManifestGenerator::new(path).write(&manifest)?;
        }

        report.log_summary();
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "Map overlay complete");
        Ok(report)
    }
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| PipelineError::Write {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
