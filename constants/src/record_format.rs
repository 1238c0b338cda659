/// Four-character codes and flag bits of the plugin record format.

pub const TES4: [u8; 4] = *b"TES4";
pub const GRUP: [u8; 4] = *b"GRUP";
pub const REFR: [u8; 4] = *b"REFR";

pub const HEDR: [u8; 4] = *b"HEDR";
pub const MAST: [u8; 4] = *b"MAST";
pub const CNAM: [u8; 4] = *b"CNAM";
pub const EDID: [u8; 4] = *b"EDID";
pub const FULL: [u8; 4] = *b"FULL";
pub const NAME: [u8; 4] = *b"NAME";
pub const DATA: [u8; 4] = *b"DATA";
pub const XMRK: [u8; 4] = *b"XMRK";
pub const TNAM: [u8; 4] = *b"TNAM";
pub const XXXX: [u8; 4] = *b"XXXX";

/// Record types that can carry a placed map marker.
pub const MARKER_RECORD_TYPES: &[[u8; 4]] = &[REFR];

/// Record and group headers are both 24 bytes.
pub const RECORD_HEADER_LEN: usize = 24;

/// Sub-field header: type + u16 size.
pub const SUBFIELD_HEADER_LEN: usize = 6;

pub const FLAG_MASTER: u32 = 0x0000_0001;
pub const FLAG_DELETED: u32 = 0x0000_0020;
pub const FLAG_LOCALIZED: u32 = 0x0000_0080;
pub const FLAG_COMPRESSED: u32 = 0x0004_0000;
