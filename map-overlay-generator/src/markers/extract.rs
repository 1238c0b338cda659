/// Walks the record store and turns placed map-marker references into entities.
use crate::error::FormatError;
use crate::markers::category::semantic_category;
use crate::markers::entity::{Category, LocationCategory, MarkerEntity, MarkerOrigin};
use crate::plugin::{DataFile, RawFormId, RecordEntry, RecordStore, RecordVisitor, SubField};
use crate::report::{Issue, IssueKind, RunReport};
use indicatif::{ProgressBar, ProgressStyle};
use map_constants::record_format::{
    DATA, EDID, FULL, MARKER_RECORD_TYPES, NAME, TNAM, XMRK,
};
use tracing::info;

/// Sub-fields of one marker record that extraction cares about.
#[derive(Default)]
struct MarkerFields {
    position: Option<[f64; 3]>,
    name: Option<String>,
    editor_id: Option<String>,
    base: Option<RawFormId>,
    type_code: Option<u16>,
    map_marker: bool,
}

pub struct MarkerExtractor<'s> {
    store: &'s RecordStore,
    markers: Vec<MarkerEntity>,
    issues: Vec<Issue>,
    progress: ProgressBar,
}

impl<'s> MarkerExtractor<'s> {
    pub fn new(store: &'s RecordStore) -> Self {
        let progress = ProgressBar::new(store.record_count() as u64);
        progress.set_style(
            ProgressStyle::with_template("[{bar:40.green/blue}] {pos}/{len} records ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        progress.set_message("Extracting markers");
        Self {
            store,
            markers: Vec::new(),
            issues: Vec::new(),
            progress,
        }
    }

    /// Visit every record and return markers in load order, file order.
    pub fn extract_all(store: &'s RecordStore, report: &mut RunReport) -> Vec<MarkerEntity> {
        let mut extractor = Self::new(store);
        store.visit(&mut extractor);
        extractor.progress.finish_with_message("Markers extracted");

        info!(
            markers = extractor.markers.len(),
            issues = extractor.issues.len(),
            "Marker extraction complete"
        );
        report.markers_extracted = extractor.markers.len();
        report.extend(extractor.issues);
        extractor.markers
    }

    fn read_fields(&self, file: &DataFile, entry: &RecordEntry) -> Result<MarkerFields, FormatError> {
        let view = file.view(entry)?;
        let mut out = MarkerFields::default();
        for field in view.fields() {
            let field = field?;
            if field.kind == DATA {
                out.position = Some(read_position(&field)?);
            } else if field.kind == FULL {
                out.name = Some(read_name(&field, file.header().is_localized()));
            } else if field.kind == EDID {
                out.editor_id = Some(field.zstring());
            } else if field.kind == NAME {
                let raw = field.u32().ok_or_else(|| field.malformed("expected a 4-byte reference"))?;
                out.base = Some(RawFormId(raw));
            } else if field.kind == TNAM {
                out.type_code = field.u16();
            } else if field.kind == XMRK {
                out.map_marker = true;
            }
        }
        Ok(out)
    }

    /// Editor id of the base object a marker points at, or the reason it cannot be found.
    fn base_editor_id(&self, file: &DataFile, raw: RawFormId) -> Result<Option<String>, String> {
        let (target_file, target) = self
            .store
            .resolve_reference(file, raw)
            .map_err(|e| e.to_string())?;
        let view = target_file.view(target).map_err(|e| e.to_string())?;
        let editor_id = view.field(EDID).map_err(|e| e.to_string())?;
        Ok(editor_id.map(|f| f.zstring()))
    }

    fn extract(&mut self, file: &DataFile, entry: &RecordEntry) -> Result<Option<MarkerEntity>, FormatError> {
        let fields = self.read_fields(file, entry)?;
        let Some(position) = fields.position else {
            return Ok(None);
        };
        if !fields.map_marker && fields.name.is_none() {
            return Ok(None);
        }

        let name = fields
            .name
            .clone()
            .or_else(|| fields.editor_id.clone())
            .unwrap_or_else(|| entry.id.to_string());

        let category = match fields.base.filter(|raw| !raw.is_null()) {
            Some(raw) => match self.base_editor_id(file, raw) {
                Ok(editor_id) => semantic_category(&name, editor_id.as_deref(), fields.type_code),
                Err(reason) => {
                    self.issues.push(Issue {
                        kind: IssueKind::Resolution,
                        source: format!("{}:{}", file.name(), entry.id),
                        message: reason,
                    });
                    LocationCategory::Other
                }
            },
            None => semantic_category(&name, None, fields.type_code),
        };

        Ok(Some(MarkerEntity {
            id: entry.id,
            name,
            position,
            type_code: fields.type_code,
            category: Category::Location(category),
            origin: MarkerOrigin::Plugin {
                file: file.name().to_string(),
            },
            location: None,
        }))
    }
}

impl RecordVisitor for MarkerExtractor<'_> {
    fn visit(&mut self, file: &DataFile, entry: &RecordEntry) {
        self.progress.inc(1);
        if !MARKER_RECORD_TYPES.iter().any(|t| entry.kind() == *t) || entry.header.is_deleted() {
            return;
        }
        // Overridden copies are handled once, through the winning file.
        if !self.store.is_winner(file.index(), entry.id) {
            return;
        }
        match self.extract(file, entry) {
            Ok(Some(marker)) => self.markers.push(marker),
            Ok(None) => {}
            Err(e) => self.issues.push(Issue {
                kind: IssueKind::Format,
                source: format!("{}:{}", file.name(), entry.id),
                message: format!("record skipped: {e}"),
            }),
        }
    }
}

fn read_position(field: &SubField<'_>) -> Result<[f64; 3], FormatError> {
    if field.data.len() < 12 {
        return Err(field.malformed("position needs 12 bytes"));
    }
    let mut out = [0.0; 3];
    for (i, chunk) in field.data[..12].chunks_exact(4).enumerate() {
        let bytes: [u8; 4] = chunk.try_into().map_err(|_| field.malformed("position"))?;
        out[i] = f64::from(f32::from_le_bytes(bytes));
    }
    Ok(out)
}

/// `FULL` text, or a placeholder naming the string id for localized plugins.
fn read_name(field: &SubField<'_>, localized: bool) -> String {
    let looks_like_id = field.data.len() == 4 && field.data[3] != 0;
    if localized || looks_like_id {
        if let Some(id) = field.u32() {
            return format!("[LSTRING:{id:08X}]");
        }
    }
    field.zstring()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::builder::{PluginBuilder, placement, zstring};
    use crate::plugin::{FileIndex, PluginSource, RecordIdentifier};
    use map_constants::record_format::{FLAG_DELETED, FLAG_LOCALIZED, REFR};

    fn extract(sources: Vec<(&str, Vec<u8>)>) -> (Vec<MarkerEntity>, RunReport) {
        let mut report = RunReport::new();
        let sources = sources
            .into_iter()
            .map(|(n, b)| PluginSource::new(n, b))
            .collect();
        let store = RecordStore::from_sources(sources, &mut report);
        let markers = MarkerExtractor::extract_all(&store, &mut report);
        (markers, report)
    }

    fn base() -> Vec<u8> {
        PluginBuilder::new()
            .record(*b"STAT", 0x10, 0, &[(EDID, zstring("VaultDoorMarker"))])
            .record(
                REFR,
                0x20,
                0,
                &[
                    (NAME, 0x10u32.to_le_bytes().to_vec()),
                    (DATA, placement(100.0, 200.0, 5.0)),
                    (XMRK, vec![]),
                    (FULL, zstring("Somewhere Quiet")),
                ],
            )
            .build()
    }

    #[test]
    fn extracts_position_name_and_editor_id_category() {
        let (markers, report) = extract(vec![("Base.esm", base())]);
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.name, "Somewhere Quiet");
        assert_eq!(m.position, [100.0, 200.0, 5.0]);
        assert_eq!(m.category, Category::Location(LocationCategory::Vault));
        assert_eq!(m.id, RecordIdentifier::new(FileIndex(0), 0x20));
    }

    #[test]
    fn dangling_base_reference_downgrades_to_other() {
        let bytes = PluginBuilder::new()
            .record(
                REFR,
                0x20,
                0,
                &[
                    (NAME, 0x0000_0999u32.to_le_bytes().to_vec()),
                    (DATA, placement(0.0, 0.0, 0.0)),
                    (FULL, zstring("Vault 111")),
                ],
            )
            .build();
        let (markers, report) = extract(vec![("Lonely.esp", bytes)]);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].category, Category::Location(LocationCategory::Other));
        assert_eq!(report.count(IssueKind::Resolution), 1);
    }

    #[test]
    fn override_payload_is_used_once() {
        let patch = PluginBuilder::new()
            .master("Base.esm")
            .record(
                REFR,
                0x20,
                0,
                &[
                    (DATA, placement(300.0, 400.0, 0.0)),
                    (FULL, zstring("Renamed Place")),
                ],
            )
            .build();
        let (markers, _) = extract(vec![("Base.esm", base()), ("Patch.esp", patch)]);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Renamed Place");
        assert_eq!(markers[0].x(), 300.0);
        assert_eq!(markers[0].id, RecordIdentifier::new(FileIndex(0), 0x20));
        assert_eq!(
            markers[0].origin,
            MarkerOrigin::Plugin {
                file: "Patch.esp".into()
            }
        );
    }

    #[test]
    fn deleted_and_unnamed_records_are_skipped() {
        let bytes = PluginBuilder::new()
            .record(
                REFR,
                0x1,
                FLAG_DELETED,
                &[(DATA, placement(0.0, 0.0, 0.0)), (FULL, zstring("Gone"))],
            )
            .record(REFR, 0x2, 0, &[(DATA, placement(0.0, 0.0, 0.0))])
            .build();
        let (markers, report) = extract(vec![("A.esp", bytes)]);
        assert!(markers.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn short_position_skips_only_that_record() {
        let bytes = PluginBuilder::new()
            .record(REFR, 0x1, 0, &[(DATA, vec![0; 8]), (FULL, zstring("Broken"))])
            .record(
                REFR,
                0x2,
                0,
                &[(DATA, placement(1.0, 2.0, 3.0)), (FULL, zstring("Fine"))],
            )
            .build();
        let (markers, report) = extract(vec![("A.esp", bytes)]);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Fine");
        assert_eq!(report.count(IssueKind::Format), 1);
    }

    #[test]
    fn localized_names_become_placeholders() {
        let bytes = PluginBuilder::new()
            .header_flags(FLAG_LOCALIZED)
            .record(
                REFR,
                0x1,
                0,
                &[
                    (DATA, placement(0.0, 0.0, 0.0)),
                    (FULL, 0x0001_E240u32.to_le_bytes().to_vec()),
                ],
            )
            .build();
        let (markers, _) = extract(vec![("L.esm", bytes)]);
        assert_eq!(markers[0].name, "[LSTRING:0001E240]");
    }

    #[test]
    fn compressed_markers_are_read() {
        let bytes = PluginBuilder::new()
            .compressed_record(
                REFR,
                0x5,
                0,
                &[
                    (DATA, placement(7.0, 8.0, 9.0)),
                    (XMRK, vec![]),
                    (TNAM, 8u16.to_le_bytes().to_vec()),
                ],
            )
            .build();
        let (markers, report) = extract(vec![("Z.esm", bytes)]);
        assert!(report.is_clean());
        assert_eq!(markers[0].category, Category::Location(LocationCategory::Military));
        assert_eq!(markers[0].type_code, Some(8));
    }
}
