use log::warn;

use crate::error::*;
use crate::tables::{read_u16, read_u32, tag};
use crate::writer::ByteWriter;

/// Corresponds to the sfnt *"Offset Table"* at the start of the file.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff>
///
/// `search_range`, `entry_selector` and `range_shift` are functions of
/// `num_tables` and are recomputed whenever a directory is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    pub scaler_type: u32,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl OffsetTable {
    pub fn new(scaler_type: u32, num_tables: u16) -> Self {
        let (search_range, entry_selector, range_shift) = derived_fields(num_tables);

        Self {
            scaler_type,
            num_tables,
            search_range,
            entry_selector,
            range_shift,
        }
    }

    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 12 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::OffsetTable,
            ));
        }

        let scaler_type = read_u32(bytes, 0);

        if scaler_type == tag(b"OTTO") {
            return Err(TtError::Table(
                TtErrorKind::UnsupportedTable,
                TtErrorSource::OffsetTable,
            ));
        }

        if scaler_type != 0x00010000 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::OffsetTable,
            ));
        }

        let num_tables = read_u16(bytes, 4);
        let search_range = read_u16(bytes, 6);
        let entry_selector = read_u16(bytes, 8);
        let range_shift = read_u16(bytes, 10);

        let (want_sr, want_es, want_rs) = derived_fields(num_tables);

        if search_range != want_sr || entry_selector != want_es || range_shift != want_rs {
            warn!(
                "offset table derived fields inconsistent with numTables {}: \
                 got ({}, {}, {}), expected ({}, {}, {})",
                num_tables, search_range, entry_selector, range_shift, want_sr, want_es, want_rs,
            );
        }

        Ok(Self {
            scaler_type,
            num_tables,
            search_range,
            entry_selector,
            range_shift,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        let (search_range, entry_selector, range_shift) = derived_fields(self.num_tables);

        w.write_u32(self.scaler_type);
        w.write_u16(self.num_tables);
        w.write_u16(search_range);
        w.write_u16(entry_selector);
        w.write_u16(range_shift);
    }
}

fn derived_fields(num_tables: u16) -> (u16, u16, u16) {
    let entry_selector = if num_tables > 0 {
        (num_tables as f32).log2().floor() as u32
    } else {
        0
    };
    let search_range = 16u32 * 2u32.pow(entry_selector);
    let range_shift = (num_tables as u32 * 16).saturating_sub(search_range);

    (search_range as u16, entry_selector as u16, range_shift as u16)
}

/// Corresponds to one sfnt *"Table Record"* directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    pub fn try_parse(bytes: &[u8], base_offset: usize) -> Result<Self, TtError> {
        if bytes.len() < base_offset + 16 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::TableRecord,
            ));
        }

        Ok(Self {
            table_tag: read_u32(bytes, base_offset),
            checksum: read_u32(bytes, base_offset + 4),
            offset: read_u32(bytes, base_offset + 8),
            length: read_u32(bytes, base_offset + 12),
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.table_tag);
        w.write_u32(self.checksum);
        w.write_u32(self.offset);
        w.write_u32(self.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_num_tables() {
        // 2^3 = 8 is the largest power of two not above 12.
        assert_eq!(derived_fields(12), (128, 3, 64));
        assert_eq!(derived_fields(16), (256, 4, 0));
        assert_eq!(derived_fields(1), (16, 0, 0));
    }

    #[test]
    fn rejects_cff_flavoured_fonts() {
        let mut bytes = vec![0u8; 12];
        bytes[..4].copy_from_slice(b"OTTO");

        assert!(matches!(
            OffsetTable::try_parse(&bytes),
            Err(TtError::Table(
                TtErrorKind::UnsupportedTable,
                TtErrorSource::OffsetTable
            ))
        ));
    }
}
