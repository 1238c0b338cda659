/// Collectible positions from hand-curated CSV tables.
use crate::markers::entity::{Category, CollectibleKind, MarkerEntity, MarkerOrigin};
use crate::plugin::{FileIndex, RecordIdentifier};
use crate::report::{IssueKind, RunReport};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CollectibleRow {
    name: String,
    world_x: f64,
    world_y: f64,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Kind implied by a table's file name, e.g. `fusion_cores.csv`.
fn kind_from_file_name(source: &str) -> Option<CollectibleKind> {
    let stem = Path::new(source).file_stem()?.to_str()?;
    CollectibleKind::from_key(stem).or_else(|| CollectibleKind::from_key(stem.strip_suffix('s')?))
}

/// Parse one table. Rows get identifiers in the collectible file index,
/// numbered from `next_ordinal`, which is advanced past the rows read.
pub fn read_collectibles<R: io::Read>(
    reader: R,
    source: &str,
    next_ordinal: &mut u32,
    report: &mut RunReport,
) -> Vec<MarkerEntity> {
    let fallback_kind = kind_from_file_name(source);
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    for (row_number, row) in csv.deserialize::<CollectibleRow>().enumerate() {
        let row_source = format!("{source}:{}", row_number + 2);
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.record(IssueKind::Input, row_source, format!("unreadable row: {e}"));
                continue;
            }
        };
        let kind = match row.category.as_deref().filter(|c| !c.is_empty()) {
            Some(key) => CollectibleKind::from_key(key),
            None => fallback_kind,
        };
        let Some(kind) = kind else {
            report.record(
                IssueKind::Input,
                row_source,
                format!("unknown collectible category {:?}", row.category.unwrap_or_default()),
            );
            continue;
        };

        let id = RecordIdentifier::new(FileIndex::COLLECTIBLES, *next_ordinal);
        *next_ordinal += 1;
        out.push(MarkerEntity {
            id,
            name: row.name,
            position: [row.world_x, row.world_y, 0.0],
            type_code: None,
            category: Category::Collectible(kind),
            origin: MarkerOrigin::Collectible {
                source: source.to_string(),
            },
            location: row.location.filter(|l| !l.is_empty()),
        });
    }
    out
}

/// Load every table in order. A table that cannot be opened is reported and skipped.
pub fn load_collectibles(paths: &[PathBuf], report: &mut RunReport) -> Vec<MarkerEntity> {
    let mut next_ordinal = 0;
    let mut all = Vec::new();
    for path in paths {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::File::open(path) {
            Ok(file) => {
                let rows = read_collectibles(file, &source, &mut next_ordinal, report);
                info!(file = %source, rows = rows.len(), "Loaded collectibles");
                all.extend(rows);
            }
            Err(e) => {
                warn!(file = %path.display(), "Skipping collectible table: {e}");
                report.record(IssueKind::Input, source, e);
            }
        }
    }
    report.collectibles_loaded = all.len();
    all
}
