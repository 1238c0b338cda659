/// Record headers, sub-field iteration and lazily decompressed payloads.
use crate::error::FormatError;
use crate::plugin::form_id::RawFormId;
use crate::plugin::reader::ByteReader;
use flate2::read::ZlibDecoder;
use map_constants::record_format::{
    FLAG_COMPRESSED, FLAG_DELETED, GRUP, RECORD_HEADER_LEN, SUBFIELD_HEADER_LEN, XXXX,
};
use std::borrow::Cow;
use std::fmt;
use std::io::Read;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

impl PartialEq<[u8; 4]> for FourCc {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

/// The 24-byte header shared by records and groups. For groups `data_size`
/// counts the header itself, `flags` holds the label and `form_id` the group type.
#[derive(Clone, Copy, Debug)]
pub struct RecordHeader {
    pub kind: FourCc,
    pub data_size: u32,
    pub flags: u32,
    pub form_id: RawFormId,
    pub version_control: u32,
    pub version: u16,
    pub unknown: u16,
}

impl RecordHeader {
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        if reader.remaining() < RECORD_HEADER_LEN {
            return Err(FormatError::Truncated {
                what: "record header",
                offset: reader.absolute(),
                needed: RECORD_HEADER_LEN,
                available: reader.remaining(),
            });
        }
        Ok(Self {
            kind: FourCc(reader.fourcc("record type")?),
            data_size: reader.u32("record size")?,
            flags: reader.u32("record flags")?,
            form_id: RawFormId(reader.u32("form id")?),
            version_control: reader.u32("version control")?,
            version: reader.u16("form version")?,
            unknown: reader.u16("header padding")?,
        })
    }

    pub fn is_group(&self) -> bool {
        self.kind == GRUP
    }

    pub fn is_deleted(&self) -> bool {
        self.flags & FLAG_DELETED != 0
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubField<'a> {
    pub kind: FourCc,
    /// Absolute offset of the sub-field header, or the offset within the
    /// decompressed payload for compressed records.
    pub offset: usize,
    pub data: &'a [u8],
}

impl SubField<'_> {
    pub fn u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    pub fn u16(&self) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(..2)?.try_into().ok()?;
        Some(u16::from_le_bytes(bytes))
    }

    /// NUL-terminated text, decoded lossily.
    pub fn zstring(&self) -> String {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }

    pub fn malformed(&self, reason: &'static str) -> FormatError {
        FormatError::BadField {
            field: self.kind.to_string(),
            offset: self.offset,
            reason,
        }
    }
}

/// Iterator over the sub-fields of a record payload. An `XXXX` field supplies
/// a 32-bit size for the field that follows it. Stops after the first error.
pub struct SubFields<'a> {
    reader: ByteReader<'a>,
    pending_size: Option<u32>,
}

impl<'a> SubFields<'a> {
    pub fn new(payload: &'a [u8], base: usize) -> Self {
        Self {
            reader: ByteReader::with_base(payload, base),
            pending_size: None,
        }
    }

    fn next_field(&mut self) -> Result<Option<SubField<'a>>, FormatError> {
        loop {
            if self.reader.is_empty() {
                return match self.pending_size {
                    Some(_) => Err(FormatError::Truncated {
                        what: "field after XXXX",
                        offset: self.reader.absolute(),
                        needed: SUBFIELD_HEADER_LEN,
                        available: 0,
                    }),
                    None => Ok(None),
                };
            }
            let offset = self.reader.absolute();
            let kind = FourCc(self.reader.fourcc("sub-field type")?);
            let short_size = self.reader.u16("sub-field size")?;

            if kind == XXXX {
                if short_size != 4 {
                    return Err(FormatError::BadField {
                        field: kind.to_string(),
                        offset,
                        reason: "size override must be 4 bytes",
                    });
                }
                self.pending_size = Some(self.reader.u32("size override")?);
                continue;
            }

            let size = self
                .pending_size
                .take()
                .map_or(short_size as usize, |s| s as usize);
            let data = self.reader.take(size, "sub-field data")?;
            return Ok(Some(SubField { kind, offset, data }));
        }
    }
}

impl<'a> Iterator for SubFields<'a> {
    type Item = Result<SubField<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_field() {
            Ok(field) => field.map(Ok),
            Err(e) => {
                self.reader.exhaust();
                self.pending_size = None;
                Some(Err(e))
            }
        }
    }
}

/// A record's header plus its payload, decompressed when the record is flagged.
pub struct RecordView<'a> {
    pub header: RecordHeader,
    pub offset: usize,
    data: Cow<'a, [u8]>,
}

impl<'a> RecordView<'a> {
    pub fn new(header: RecordHeader, offset: usize, payload: &'a [u8]) -> Result<Self, FormatError> {
        let data = if header.is_compressed() {
            Cow::Owned(inflate(payload, offset)?)
        } else {
            Cow::Borrowed(payload)
        };
        Ok(Self {
            header,
            offset,
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn fields(&self) -> SubFields<'_> {
        let base = match self.data {
            Cow::Borrowed(_) => self.offset + RECORD_HEADER_LEN,
            Cow::Owned(_) => 0,
        };
        SubFields::new(&self.data, base)
    }

    /// First sub-field of the given type.
    pub fn field(&self, kind: [u8; 4]) -> Result<Option<SubField<'_>>, FormatError> {
        for field in self.fields() {
            let field = field?;
            if field.kind == kind {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }
}

fn inflate(payload: &[u8], offset: usize) -> Result<Vec<u8>, FormatError> {
    let mut reader = ByteReader::with_base(payload, offset + RECORD_HEADER_LEN);
    let expected = reader.u32("decompressed size")? as usize;
    let stream = reader.take(reader.remaining(), "compressed stream")?;

    // The size field is untrusted; reserve at most a plausible ratio and
    // stop inflating one byte past the claimed size.
    let mut out = Vec::with_capacity(expected.min(stream.len().saturating_mul(64)));
    ZlibDecoder::new(stream)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| FormatError::Decompress {
            offset,
            reason: e.to_string(),
        })?;
    if out.len() != expected {
        return Err(FormatError::Decompress {
            offset,
            reason: format!("inflated to {} bytes, header says {expected}", out.len()),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::builder::field_bytes;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn header(flags: u32, size: usize) -> RecordHeader {
        RecordHeader {
            kind: FourCc(*b"REFR"),
            data_size: size as u32,
            flags,
            form_id: RawFormId(1),
            version_control: 0,
            version: 131,
            unknown: 0,
        }
    }

    #[test]
    fn iterates_fields_in_order() {
        let mut payload = field_bytes(*b"EDID", b"Marker\0");
        payload.extend(field_bytes(*b"DATA", &[0u8; 24]));
        let names: Vec<String> = SubFields::new(&payload, 0)
            .map(|f| f.unwrap().kind.to_string())
            .collect();
        assert_eq!(names, ["EDID", "DATA"]);
    }

    #[test]
    fn size_override_applies_to_next_field() {
        let big = vec![7u8; 70_000];
        let payload = field_bytes(*b"DATA", &big);
        let fields: Vec<_> = SubFields::new(&payload, 0).collect::<Result<_, _>>().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, *b"DATA");
        assert_eq!(fields[0].data.len(), 70_000);
    }

    #[test]
    fn truncated_field_yields_one_error_then_stops() {
        let mut payload = field_bytes(*b"FULL", b"Name\0");
        payload.truncate(payload.len() - 2);
        let mut fields = SubFields::new(&payload, 0);
        assert!(matches!(fields.next(), Some(Err(FormatError::Truncated { .. }))));
        assert!(fields.next().is_none());
    }

    #[test]
    fn compressed_payload_is_inflated() {
        let inner = field_bytes(*b"FULL", b"Sanctuary\0");
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&inner).unwrap();
        let mut payload = (inner.len() as u32).to_le_bytes().to_vec();
        payload.extend(encoder.finish().unwrap());

        let view = RecordView::new(header(FLAG_COMPRESSED, payload.len()), 0, &payload).unwrap();
        let name = view.field(*b"FULL").unwrap().unwrap();
        assert_eq!(name.zstring(), "Sanctuary");
    }

    #[test]
    fn oversized_length_claim_is_rejected() {
        let inner = field_bytes(*b"FULL", b"Sanctuary\0");
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&inner).unwrap();
        let mut payload = u32::MAX.to_le_bytes().to_vec();
        payload.extend(encoder.finish().unwrap());

        let err = RecordView::new(header(FLAG_COMPRESSED, payload.len()), 0, &payload)
            .err()
            .unwrap();
        assert!(matches!(err, FormatError::Decompress { .. }));
    }

    #[test]
    fn understated_length_claim_is_rejected() {
        let inner = field_bytes(*b"FULL", b"Sanctuary\0");
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&inner).unwrap();
        let mut payload = 4u32.to_le_bytes().to_vec();
        payload.extend(encoder.finish().unwrap());

        let err = RecordView::new(header(FLAG_COMPRESSED, payload.len()), 0, &payload)
            .err()
            .unwrap();
        assert!(matches!(err, FormatError::Decompress { .. }));
    }

    #[test]
    fn corrupt_stream_is_a_decompress_error() {
        let mut payload = 16u32.to_le_bytes().to_vec();
        payload.extend([1, 2, 3, 4, 5]);
        let err = RecordView::new(header(FLAG_COMPRESSED, payload.len()), 48, &payload)
            .err()
            .unwrap();
        assert!(matches!(err, FormatError::Decompress { offset: 48, .. }));
    }
}
