/// In-memory plugin writer used to synthesise fixtures.
use flate2::Compression;
use flate2::write::ZlibEncoder;
use map_constants::record_format::{
    CNAM, FLAG_COMPRESSED, GRUP, HEDR, MAST, RECORD_HEADER_LEN, TES4, XXXX,
};
use std::io::Write;

/// Encode one sub-field, preceded by an `XXXX` size override when it does not fit a u16.
pub fn field_bytes(kind: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    if data.len() > u16::MAX as usize {
        out.extend_from_slice(&XXXX);
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&kind);
        out.extend_from_slice(&0u16.to_le_bytes());
    } else {
        out.extend_from_slice(&kind);
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

pub fn zstring(text: &str) -> Vec<u8> {
    let mut out = text.as_bytes().to_vec();
    out.push(0);
    out
}

/// A `DATA` payload for a placed reference: position then rotation.
pub fn placement(x: f32, y: f32, z: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    for v in [x, y, z, 0.0, 0.0, 0.0] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn header_bytes(kind: [u8; 4], size: u32, flags: u32, form_id: u32) -> [u8; RECORD_HEADER_LEN] {
    let mut out = [0u8; RECORD_HEADER_LEN];
    out[0..4].copy_from_slice(&kind);
    out[4..8].copy_from_slice(&size.to_le_bytes());
    out[8..12].copy_from_slice(&flags.to_le_bytes());
    out[12..16].copy_from_slice(&form_id.to_le_bytes());
    out[20..22].copy_from_slice(&131u16.to_le_bytes());
    out
}

#[derive(Default)]
pub struct PluginBuilder {
    masters: Vec<String>,
    author: Option<String>,
    header_flags: u32,
    declared_count: Option<i32>,
    body: Vec<u8>,
    open_groups: Vec<usize>,
    written: i32,
}

impl PluginBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn master(mut self, name: &str) -> Self {
        self.masters.push(name.to_string());
        self
    }

    pub fn author(mut self, name: &str) -> Self {
        self.author = Some(name.to_string());
        self
    }

    pub fn header_flags(mut self, flags: u32) -> Self {
        self.header_flags = flags;
        self
    }

    /// Override the record count written to `HEDR`.
    pub fn declared_count(mut self, count: i32) -> Self {
        self.declared_count = Some(count);
        self
    }

    pub fn begin_group(mut self, label: [u8; 4], group_type: i32) -> Self {
        self.open_groups.push(self.body.len());
        let header = header_bytes(GRUP, 0, u32::from_le_bytes(label), group_type as u32);
        self.body.extend_from_slice(&header);
        self.written += 1;
        self
    }

    pub fn end_group(mut self) -> Self {
        if let Some(start) = self.open_groups.pop() {
            let size = (self.body.len() - start) as u32;
            self.body[start + 4..start + 8].copy_from_slice(&size.to_le_bytes());
        }
        self
    }

    pub fn record(self, kind: [u8; 4], form_id: u32, flags: u32, fields: &[([u8; 4], Vec<u8>)]) -> Self {
        let payload: Vec<u8> = fields
            .iter()
            .flat_map(|(k, data)| field_bytes(*k, data))
            .collect();
        self.raw_record(kind, form_id, flags, payload)
    }

    /// Same as `record` but with a zlib-compressed payload.
    pub fn compressed_record(
        self,
        kind: [u8; 4],
        form_id: u32,
        flags: u32,
        fields: &[([u8; 4], Vec<u8>)],
    ) -> Self {
        let inner: Vec<u8> = fields
            .iter()
            .flat_map(|(k, data)| field_bytes(*k, data))
            .collect();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        // Writing into a Vec cannot fail.
        let _ = encoder.write_all(&inner);
        let stream = encoder.finish().unwrap_or_default();
        let mut payload = (inner.len() as u32).to_le_bytes().to_vec();
        payload.extend(stream);
        self.raw_record(kind, form_id, flags | FLAG_COMPRESSED, payload)
    }

    /// Append a record with an arbitrary payload, consistent or not.
    pub fn raw_record(mut self, kind: [u8; 4], form_id: u32, flags: u32, payload: Vec<u8>) -> Self {
        self.body
            .extend_from_slice(&header_bytes(kind, payload.len() as u32, flags, form_id));
        self.body.extend(payload);
        self.written += 1;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        while !self.open_groups.is_empty() {
            self = self.end_group();
        }

        let mut hedr = Vec::with_capacity(12);
        hedr.extend_from_slice(&1.0f32.to_le_bytes());
        hedr.extend_from_slice(&self.declared_count.unwrap_or(self.written).to_le_bytes());
        hedr.extend_from_slice(&0x800u32.to_le_bytes());

        let mut fields = field_bytes(HEDR, &hedr);
        if let Some(author) = &self.author {
            fields.extend(field_bytes(CNAM, &zstring(author)));
        }
        for master in &self.masters {
            fields.extend(field_bytes(MAST, &zstring(master)));
            fields.extend(field_bytes(*b"DATA", &0u64.to_le_bytes()));
        }

        let mut out = Vec::with_capacity(RECORD_HEADER_LEN + fields.len() + self.body.len());
        out.extend_from_slice(&header_bytes(TES4, fields.len() as u32, self.header_flags, 0));
        out.extend(fields);
        out.extend(self.body);
        out
    }
}
