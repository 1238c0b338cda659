/// Cross-file record identifiers and the per-file master table that decodes them.
use crate::error::ResolutionError;
use serde::Serialize;
use std::fmt;

/// Position of a data file in the load order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileIndex(pub u8);

impl FileIndex {
    /// Reserved for identifiers minted for tabular collectible rows.
    pub const COLLECTIBLES: FileIndex = FileIndex(0xFF);

    /// Number of indices available to data files.
    pub const MAX_DATA_FILES: usize = 0xFF;
}

/// A reference exactly as stored in a file: master slot in the high byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawFormId(pub u32);

impl RawFormId {
    pub fn slot(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn local(self) -> u32 {
        self.0 & RecordIdentifier::LOCAL_MASK
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RawFormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Load-order-qualified record key: the file that defined the record plus its
/// 24-bit local value. Ordering is by file, then local value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordIdentifier {
    file: FileIndex,
    local: u32,
}

impl RecordIdentifier {
    pub const LOCAL_MASK: u32 = 0x00FF_FFFF;

    pub fn new(file: FileIndex, local: u32) -> Self {
        Self {
            file,
            local: local & Self::LOCAL_MASK,
        }
    }

    pub fn file(self) -> FileIndex {
        self.file
    }

    pub fn local(self) -> u32 {
        self.local
    }

    /// Packed load-order form (`file << 24 | local`).
    pub fn pack(self) -> u32 {
        (u32::from(self.file.0) << 24) | self.local
    }

    pub fn unpack(packed: u32) -> Self {
        Self::new(FileIndex((packed >> 24) as u8), packed)
    }
}

impl fmt::Display for RecordIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.pack())
    }
}

/// Maps the master slots a file writes into its references onto load-order indices.
#[derive(Clone, Debug)]
pub struct MasterTable {
    own: FileIndex,
    names: Vec<String>,
    /// `None` when the named master was not loaded ahead of this file.
    slots: Vec<Option<FileIndex>>,
}

impl MasterTable {
    pub fn new(own: FileIndex, names: Vec<String>, slots: Vec<Option<FileIndex>>) -> Self {
        debug_assert_eq!(names.len(), slots.len());
        Self { own, names, slots }
    }

    pub fn own_index(&self) -> FileIndex {
        self.own
    }

    pub fn master_names(&self) -> &[String] {
        &self.names
    }

    /// Decode a stored reference. Slots below the master count name a master;
    /// the slot equal to the master count is the file itself.
    pub fn resolve(&self, raw: RawFormId) -> Result<RecordIdentifier, ResolutionError> {
        let slot = raw.slot() as usize;
        match slot.cmp(&self.slots.len()) {
            std::cmp::Ordering::Less => match self.slots[slot] {
                Some(file) => Ok(RecordIdentifier::new(file, raw.local())),
                None => Err(ResolutionError::MasterNotLoaded {
                    raw,
                    master: self.names[slot].clone(),
                }),
            },
            std::cmp::Ordering::Equal => Ok(RecordIdentifier::new(self.own, raw.local())),
            std::cmp::Ordering::Greater => Err(ResolutionError::UnknownMasterSlot {
                raw,
                slot: raw.slot(),
                masters: self.slots.len(),
            }),
        }
    }

    /// Inverse of `resolve` for identifiers this file can express.
    pub fn encode(&self, id: RecordIdentifier) -> Option<RawFormId> {
        let slot = if id.file() == self.own {
            self.slots.len()
        } else {
            self.slots.iter().position(|s| *s == Some(id.file()))?
        };
        let slot = u8::try_from(slot).ok()?;
        Some(RawFormId((u32::from(slot) << 24) | id.local()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MasterTable {
        // File loaded third, with two masters loaded at indices 0 and 1.
        MasterTable::new(
            FileIndex(2),
            vec!["Base.esm".into(), "DLC.esm".into()],
            vec![Some(FileIndex(0)), Some(FileIndex(1))],
        )
    }

    #[test]
    fn pack_and_unpack_are_inverse() {
        let id = RecordIdentifier::new(FileIndex(3), 0x00AB_CDEF);
        assert_eq!(id.pack(), 0x03AB_CDEF);
        assert_eq!(RecordIdentifier::unpack(id.pack()), id);
    }

    #[test]
    fn local_value_is_masked_to_24_bits() {
        let id = RecordIdentifier::new(FileIndex(1), 0xFF00_0001);
        assert_eq!(id.local(), 1);
        assert_eq!(id.file(), FileIndex(1));
    }

    #[test]
    fn same_local_in_different_files_are_distinct() {
        let a = RecordIdentifier::new(FileIndex(0), 0x1234);
        let b = RecordIdentifier::new(FileIndex(1), 0x1234);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn master_slot_resolves_to_master_index() {
        let t = table();
        let id = t.resolve(RawFormId(0x0100_0042)).unwrap();
        assert_eq!(id, RecordIdentifier::new(FileIndex(1), 0x42));
    }

    #[test]
    fn own_slot_resolves_to_the_scanning_file() {
        let t = table();
        let id = t.resolve(RawFormId(0x0200_0042)).unwrap();
        assert_eq!(id.file(), FileIndex(2));
    }

    #[test]
    fn slot_past_own_is_unknown() {
        let t = table();
        let err = t.resolve(RawFormId(0x0300_0042)).unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownMasterSlot { slot: 3, .. }));
    }

    #[test]
    fn missing_master_is_reported_by_name() {
        let t = MasterTable::new(FileIndex(1), vec!["Gone.esm".into()], vec![None]);
        let err = t.resolve(RawFormId(0x0000_0010)).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MasterNotLoaded {
                raw: RawFormId(0x10),
                master: "Gone.esm".into()
            }
        );
    }

    #[test]
    fn encode_inverts_resolve() {
        let t = table();
        for raw in [0x0000_0001, 0x0100_0002, 0x0200_0003] {
            let id = t.resolve(RawFormId(raw)).unwrap();
            assert_eq!(t.encode(id), Some(RawFormId(raw)));
        }
        assert_eq!(t.encode(RecordIdentifier::new(FileIndex(9), 1)), None);
    }
}
