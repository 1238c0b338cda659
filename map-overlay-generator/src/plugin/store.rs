/// Loads layered plugin files into a queryable record index.
use crate::error::{FormatError, ResolutionError};
use crate::plugin::form_id::{FileIndex, MasterTable, RawFormId, RecordIdentifier};
use crate::plugin::reader::ByteReader;
use crate::plugin::record::{FourCc, RecordHeader, RecordView, SubFields};
use crate::report::{IssueKind, RunReport};
use indicatif::{ProgressBar, ProgressStyle};
use map_constants::record_format::{
    CNAM, FLAG_LOCALIZED, HEDR, MAST, RECORD_HEADER_LEN, TES4,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Index entry for one (non-group) record.
#[derive(Clone, Copy, Debug)]
pub struct RecordEntry {
    pub id: RecordIdentifier,
    pub header: RecordHeader,
    /// Absolute offset of the record header within its file.
    pub offset: usize,
}

impl RecordEntry {
    pub fn kind(&self) -> FourCc {
        self.header.kind
    }

    fn payload_range(&self) -> std::ops::Range<usize> {
        let start = self.offset + RECORD_HEADER_LEN;
        start..start + self.header.data_size as usize
    }
}

/// Contents of the leading `TES4` record.
#[derive(Clone, Debug, Default)]
pub struct PluginHeader {
    pub flags: u32,
    pub version: f32,
    pub declared_records: i32,
    pub next_object_id: u32,
    pub author: Option<String>,
    pub masters: Vec<String>,
}

impl PluginHeader {
    fn parse(header: &RecordHeader, payload: &[u8]) -> Result<Self, FormatError> {
        let mut out = PluginHeader {
            flags: header.flags,
            ..Default::default()
        };
        let mut saw_hedr = false;
        for field in SubFields::new(payload, RECORD_HEADER_LEN) {
            let field = field?;
            if field.kind == HEDR {
                let mut r = ByteReader::with_base(field.data, field.offset + 6);
                out.version = r.f32("HEDR version").map_err(|_| FormatError::MissingHedr)?;
                out.declared_records = r.i32("HEDR count").map_err(|_| FormatError::MissingHedr)?;
                out.next_object_id = r.u32("HEDR next id").map_err(|_| FormatError::MissingHedr)?;
                saw_hedr = true;
            } else if field.kind == MAST {
                out.masters.push(field.zstring());
            } else if field.kind == CNAM {
                out.author = Some(field.zstring());
            }
        }
        if !saw_hedr {
            return Err(FormatError::MissingHedr);
        }
        Ok(out)
    }

    pub fn is_localized(&self) -> bool {
        self.flags & FLAG_LOCALIZED != 0
    }
}

/// One loaded plugin: its bytes, header, master table and record index.
pub struct DataFile {
    name: String,
    bytes: Vec<u8>,
    header: PluginHeader,
    masters: MasterTable,
    entries: Vec<RecordEntry>,
    by_id: HashMap<RecordIdentifier, usize>,
    group_count: usize,
}

impl DataFile {
    /// Parse and index `bytes`. `loaded` maps lowercase names of files already
    /// in the load order to their indices.
    pub fn parse(
        name: &str,
        index: FileIndex,
        bytes: Vec<u8>,
        loaded: &HashMap<String, FileIndex>,
    ) -> Result<Self, FormatError> {
        let mut reader = ByteReader::new(&bytes);
        let tes4 = RecordHeader::read(&mut reader)?;
        if tes4.kind != TES4 {
            return Err(FormatError::BadMagic {
                found: tes4.kind.to_string(),
            });
        }
        let payload = reader.take(tes4.data_size as usize, "header record")?;
        let header = PluginHeader::parse(&tes4, payload)?;

        let slots = header
            .masters
            .iter()
            .map(|m| loaded.get(&m.to_lowercase()).copied())
            .collect();
        let masters = MasterTable::new(index, header.masters.clone(), slots);

        let mut entries = Vec::new();
        let mut by_id = HashMap::new();
        let mut group_ends: Vec<usize> = Vec::new();
        let mut group_count = 0;
        let mut unresolved = 0;

        while !reader.is_empty() || !group_ends.is_empty() {
            let offset = reader.position();
            while let Some(&end) = group_ends.last() {
                if offset < end {
                    break;
                }
                if offset > end {
                    return Err(FormatError::GroupOverrun {
                        offset,
                        parent_end: end,
                    });
                }
                group_ends.pop();
            }
            if reader.is_empty() {
                break;
            }

            let rh = RecordHeader::read(&mut reader)?;
            if rh.is_group() {
                if (rh.data_size as usize) < RECORD_HEADER_LEN {
                    return Err(FormatError::GroupTooSmall {
                        offset,
                        size: rh.data_size,
                    });
                }
                let end = offset + rh.data_size as usize;
                if end > bytes.len() {
                    return Err(FormatError::Truncated {
                        what: "group",
                        offset,
                        needed: rh.data_size as usize,
                        available: bytes.len() - offset,
                    });
                }
                if let Some(&parent_end) = group_ends.last() {
                    if end > parent_end {
                        return Err(FormatError::GroupOverrun { offset, parent_end });
                    }
                }
                group_ends.push(end);
                group_count += 1;
                continue;
            }

            reader.take(rh.data_size as usize, "record data")?;
            match masters.resolve(rh.form_id) {
                Ok(id) => {
                    by_id.insert(id, entries.len());
                    entries.push(RecordEntry {
                        id,
                        header: rh,
                        offset,
                    });
                }
                Err(e) => {
                    unresolved += 1;
                    debug!(file = name, offset, "Unindexed record: {e}");
                }
            }
        }

        let observed = entries.len() + unresolved + group_count;
        if header.declared_records >= 0 && header.declared_records as usize != observed {
            warn!(
                file = name,
                declared = header.declared_records,
                observed,
                "Declared record count does not match file contents"
            );
        }
        if unresolved > 0 {
            warn!(
                file = name,
                unresolved, "Records with unresolvable form ids were not indexed"
            );
        }

        Ok(Self {
            name: name.to_string(),
            bytes,
            header,
            masters,
            entries,
            by_id,
            group_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> FileIndex {
        self.masters.own_index()
    }

    pub fn header(&self) -> &PluginHeader {
        &self.header
    }

    pub fn masters(&self) -> &MasterTable {
        &self.masters
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Records in file order.
    pub fn records(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn get(&self, id: RecordIdentifier) -> Option<&RecordEntry> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    /// Materialise a record, inflating it if compressed.
    pub fn view(&self, entry: &RecordEntry) -> Result<RecordView<'_>, FormatError> {
        RecordView::new(entry.header, entry.offset, &self.bytes[entry.payload_range()])
    }
}

/// Name and contents of a plugin that has not been parsed yet.
pub struct PluginSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PluginSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Receives every indexed record, files in load order and records in file order.
pub trait RecordVisitor {
    fn visit(&mut self, file: &DataFile, entry: &RecordEntry);
}

/// All successfully loaded files plus the winning override for every identifier.
pub struct RecordStore {
    files: Vec<DataFile>,
    /// Identifier -> (position in `files`, entry index) of the last-loaded definition.
    winners: HashMap<RecordIdentifier, (usize, usize)>,
}

impl RecordStore {
    /// Read and parse `paths` in order. Unreadable or malformed files are
    /// reported and skipped.
    pub fn load(paths: &[PathBuf], report: &mut RunReport) -> Self {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let name = file_name(path);
            match std::fs::read(path) {
                Ok(bytes) => sources.push(PluginSource::new(name, bytes)),
                Err(e) => {
                    warn!(file = %path.display(), "Skipping unreadable plugin: {e}");
                    report.files_skipped += 1;
                    report.record(IssueKind::Format, name, FormatError::Io(e));
                }
            }
        }
        Self::from_sources(sources, report)
    }

    pub fn from_sources(sources: Vec<PluginSource>, report: &mut RunReport) -> Self {
        let pb = ProgressBar::new(sources.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} plugins ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Indexing records");

        let mut files: Vec<DataFile> = Vec::new();
        let mut loaded: HashMap<String, FileIndex> = HashMap::new();

        for source in sources {
            pb.inc(1);
            if files.len() >= FileIndex::MAX_DATA_FILES {
                let err = FormatError::TooManyFiles {
                    limit: FileIndex::MAX_DATA_FILES,
                };
                warn!(file = %source.name, "Skipping plugin: {err}");
                report.files_skipped += 1;
                report.record(IssueKind::Format, source.name, err);
                continue;
            }

            let index = FileIndex(files.len() as u8);
            match DataFile::parse(&source.name, index, source.bytes, &loaded) {
                Ok(file) => {
                    info!(
                        file = %file.name(),
                        index = index.0,
                        records = file.records().len(),
                        groups = file.group_count(),
                        masters = file.header().masters.len(),
                        "Loaded plugin"
                    );
                    loaded.insert(source.name.to_lowercase(), index);
                    files.push(file);
                }
                Err(err) => {
                    warn!(file = %source.name, "Skipping malformed plugin: {err}");
                    report.files_skipped += 1;
                    report.record(IssueKind::Format, source.name, err);
                }
            }
        }
        pb.finish_with_message("Records indexed");
        report.files_loaded = files.len();

        let mut winners = HashMap::new();
        for (pos, file) in files.iter().enumerate() {
            for (i, entry) in file.records().iter().enumerate() {
                winners.insert(entry.id, (pos, i));
            }
        }

        Self { files, winners }
    }

    pub fn files(&self) -> &[DataFile] {
        &self.files
    }

    pub fn file(&self, index: FileIndex) -> Option<&DataFile> {
        self.files.get(index.0 as usize)
    }

    /// The entry for `id` as written by one specific file.
    pub fn lookup_in(&self, file: FileIndex, id: RecordIdentifier) -> Option<&RecordEntry> {
        self.file(file)?.get(id)
    }

    /// The last-loaded definition of `id` and the file that carries it.
    pub fn resolve(&self, id: RecordIdentifier) -> Option<(&DataFile, &RecordEntry)> {
        let &(pos, i) = self.winners.get(&id)?;
        let file = &self.files[pos];
        Some((file, &file.records()[i]))
    }

    /// Whether `file`'s copy of `id` is the one later stages should use.
    pub fn is_winner(&self, file: FileIndex, id: RecordIdentifier) -> bool {
        self.winners
            .get(&id)
            .is_some_and(|&(pos, _)| self.files[pos].index() == file)
    }

    /// Decode a reference stored in `from` and follow it to the winning record.
    pub fn resolve_reference(
        &self,
        from: &DataFile,
        raw: RawFormId,
    ) -> Result<(&DataFile, &RecordEntry), ResolutionError> {
        let id = from.masters().resolve(raw)?;
        self.resolve(id).ok_or(ResolutionError::NotFound { id })
    }

    pub fn record_count(&self) -> usize {
        self.files.iter().map(|f| f.records().len()).sum()
    }

    pub fn visit<V: RecordVisitor>(&self, visitor: &mut V) {
        for file in &self.files {
            for entry in file.records() {
                visitor.visit(file, entry);
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::builder::{PluginBuilder, placement, zstring};
    use map_constants::record_format::{EDID, FULL, REFR};

    fn base_plugin() -> Vec<u8> {
        PluginBuilder::new()
            .begin_group(*b"REFR", 0)
            .record(REFR, 0x0000_0100, 0, &[(EDID, zstring("BaseMarker"))])
            .record(REFR, 0x0000_0200, 0, &[(EDID, zstring("Other"))])
            .end_group()
            .build()
    }

    fn store(sources: Vec<(&str, Vec<u8>)>) -> (RecordStore, RunReport) {
        let mut report = RunReport::new();
        let sources = sources
            .into_iter()
            .map(|(n, b)| PluginSource::new(n, b))
            .collect();
        (RecordStore::from_sources(sources, &mut report), report)
    }

    #[test]
    fn indexes_records_inside_nested_groups() {
        let bytes = PluginBuilder::new()
            .begin_group(*b"WRLD", 0)
            .begin_group(*b"CELL", 1)
            .record(REFR, 0x10, 0, &[(FULL, zstring("Inner"))])
            .end_group()
            .record(REFR, 0x11, 0, &[])
            .end_group()
            .record(REFR, 0x12, 0, &[])
            .build();
        let (store, report) = store(vec![("A.esm", bytes)]);
        assert!(report.is_clean());
        let file = &store.files()[0];
        let locals: Vec<u32> = file.records().iter().map(|e| e.id.local()).collect();
        assert_eq!(locals, [0x10, 0x11, 0x12]);
        assert_eq!(file.group_count(), 2);
    }

    #[test]
    fn bad_magic_skips_only_that_file() {
        let mut broken = base_plugin();
        broken[0..4].copy_from_slice(b"TES3");
        let (store, report) = store(vec![("Broken.esp", broken), ("Base.esm", base_plugin())]);
        assert_eq!(store.files().len(), 1);
        assert_eq!(store.files()[0].name(), "Base.esm");
        assert_eq!(store.files()[0].index(), FileIndex(0));
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.count(IssueKind::Format), 1);
    }

    #[test]
    fn oversized_record_is_a_format_error() {
        let mut bytes = base_plugin();
        let len = bytes.len();
        bytes.truncate(len - 3);
        let result = DataFile::parse("Cut.esp", FileIndex(0), bytes, &HashMap::new());
        assert!(matches!(result, Err(FormatError::Truncated { .. })));
    }

    #[test]
    fn header_without_hedr_is_rejected() {
        let mut bytes = vec![0u8; RECORD_HEADER_LEN];
        bytes[0..4].copy_from_slice(b"TES4");
        let result = DataFile::parse("Empty.esp", FileIndex(0), bytes, &HashMap::new());
        assert!(matches!(result, Err(FormatError::MissingHedr)));
    }

    #[test]
    fn lookup_is_scoped_to_the_defining_file() {
        // Both files define local 0x100 as their own record.
        let patch = PluginBuilder::new()
            .record(REFR, 0x0000_0100, 0, &[(EDID, zstring("PatchOwn"))])
            .build();
        let (store, _) = store(vec![("Base.esm", base_plugin()), ("Patch.esp", patch)]);

        let base_id = RecordIdentifier::new(FileIndex(0), 0x100);
        let patch_id = RecordIdentifier::new(FileIndex(1), 0x100);
        let (file, entry) = store.resolve(base_id).unwrap();
        assert_eq!(file.name(), "Base.esm");
        assert_eq!(entry.id, base_id);
        let (file, _) = store.resolve(patch_id).unwrap();
        assert_eq!(file.name(), "Patch.esp");
        assert!(store.lookup_in(FileIndex(0), patch_id).is_none());
    }

    #[test]
    fn override_wins_but_keeps_the_defining_index() {
        let patch = PluginBuilder::new()
            .master("Base.esm")
            .record(REFR, 0x0000_0100, 0, &[(EDID, zstring("Overridden"))])
            .build();
        let (store, _) = store(vec![("Base.esm", base_plugin()), ("Patch.esp", patch)]);

        let id = RecordIdentifier::new(FileIndex(0), 0x100);
        let (file, entry) = store.resolve(id).unwrap();
        assert_eq!(file.name(), "Patch.esp");
        assert_eq!(entry.id, id);
        assert!(store.is_winner(FileIndex(1), id));
        assert!(!store.is_winner(FileIndex(0), id));

        let view = file.view(entry).unwrap();
        assert_eq!(view.field(EDID).unwrap().unwrap().zstring(), "Overridden");
    }

    #[test]
    fn references_resolve_through_the_master_table() {
        let patch = PluginBuilder::new()
            .master("Base.esm")
            .record(REFR, 0x0100_0001, 0, &[])
            .build();
        let (store, _) = store(vec![("Base.esm", base_plugin()), ("Patch.esp", patch)]);
        let patch_file = &store.files()[1];

        let (file, entry) = store
            .resolve_reference(patch_file, RawFormId(0x0000_0200))
            .unwrap();
        assert_eq!(file.name(), "Base.esm");
        assert_eq!(entry.id, RecordIdentifier::new(FileIndex(0), 0x200));

        assert!(matches!(
            store.resolve_reference(patch_file, RawFormId(0x0000_0999)),
            Err(ResolutionError::NotFound { .. })
        ));
    }

    #[test]
    fn declared_count_mismatch_is_not_fatal() {
        let bytes = PluginBuilder::new()
            .declared_count(99)
            .record(REFR, 0x1, 0, &[])
            .build();
        let (store, report) = store(vec![("Odd.esp", bytes)]);
        assert_eq!(store.files().len(), 1);
        assert!(report.is_clean());
    }
}
