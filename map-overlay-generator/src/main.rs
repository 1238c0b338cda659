/// Map overlay generator entry point.
use anyhow::Context;
use clap::Parser;
use map_overlay_generator::{MapConfig, MapOverlayGenerator};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Render map markers from plugin files into a DXT1 DDS overlay", long_about = None)]
struct Args {
    /// Plugin files in load order (masters first).
    #[arg(long = "plugin", required = true, num_args = 1..)]
    plugins: Vec<PathBuf>,

    /// Collectible CSV tables.
    #[arg(long = "collectibles", num_args = 1..)]
    collectibles: Vec<PathBuf>,

    /// Base satellite image; a flat background is used when omitted.
    #[arg(long)]
    base: Option<PathBuf>,

    /// Output DDS texture.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON configuration overriding the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    preview: Option<PathBuf>,

    #[arg(long)]
    manifest: Option<PathBuf>,

    #[arg(long)]
    canvas_size: Option<u32>,

    #[arg(long)]
    supersample: Option<u32>,

    /// Collectible grouping radius in world units.
    #[arg(long)]
    group_threshold: Option<f64>,
}

impl Args {
    fn map_config(&self) -> anyhow::Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::from_json_file(path)?,
            None => MapConfig::default(),
        };
        if let Some(size) = self.canvas_size {
            config.canvas_size = size;
        }
        if let Some(factor) = self.supersample {
            config.supersample = factor;
        }
        if let Some(threshold) = self.group_threshold {
            config.group_threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();

    let args = Args::parse();
    let config = args.map_config().context("loading configuration")?;

    let generator = MapOverlayGenerator::new(config, args.plugins.clone(), args.output.clone())
        .with_collectibles(args.collectibles.clone())
        .with_base(args.base.clone())
        .with_preview(args.preview.clone())
        .with_manifest(args.manifest.clone());

    let report = generator
        .run()
        .with_context(|| format!("generating {}", args.output.display()))?;
    if !report.is_clean() {
        tracing::warn!(issues = report.issues.len(), "Completed with issues");
    }
    Ok(())
}
