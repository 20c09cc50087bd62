use crate::error::*;
use crate::tables::{read_i16, read_i32, read_i64, read_u16, read_u32};
use crate::writer::ByteWriter;

pub const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// Corresponds to the `head` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: i32,
    pub checksum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: i64,
    pub modified: i64,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl HeadTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 54 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::HeadTable,
            ));
        }

        let major_version = read_u16(bytes, 0);
        let minor_version = read_u16(bytes, 2);

        if major_version != 1 || minor_version != 0 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::HeadTable,
            ));
        }

        let font_revision = read_i32(bytes, 4);
        let checksum_adjustment = read_u32(bytes, 8);
        let magic_number = read_u32(bytes, 12);

        if magic_number != HEAD_MAGIC {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::HeadTable,
            ));
        }

        let index_to_loc_format = read_i16(bytes, 50);

        if index_to_loc_format != 0 && index_to_loc_format != 1 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::HeadTable,
            ));
        }

        Ok(Self {
            major_version,
            minor_version,
            font_revision,
            checksum_adjustment,
            magic_number,
            flags: read_u16(bytes, 16),
            units_per_em: read_u16(bytes, 18),
            created: read_i64(bytes, 20),
            modified: read_i64(bytes, 28),
            x_min: read_i16(bytes, 36),
            y_min: read_i16(bytes, 38),
            x_max: read_i16(bytes, 40),
            y_max: read_i16(bytes, 42),
            mac_style: read_u16(bytes, 44),
            lowest_rec_ppem: read_u16(bytes, 46),
            font_direction_hint: read_i16(bytes, 48),
            index_to_loc_format,
            glyph_data_format: read_i16(bytes, 52),
        })
    }

    /// The checksum adjustment is emitted as zero; the serializer patches
    /// the real value in once the whole-file checksum is known.
    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.major_version);
        w.write_u16(self.minor_version);
        w.write_i32(self.font_revision);
        w.write_u32(0);
        w.write_u32(HEAD_MAGIC);
        w.write_u16(self.flags);
        w.write_u16(self.units_per_em);
        w.write_i64(self.created);
        w.write_i64(self.modified);
        w.write_i16(self.x_min);
        w.write_i16(self.y_min);
        w.write_i16(self.x_max);
        w.write_i16(self.y_max);
        w.write_u16(self.mac_style);
        w.write_u16(self.lowest_rec_ppem);
        w.write_i16(self.font_direction_hint);
        w.write_i16(self.index_to_loc_format);
        w.write_i16(self.glyph_data_format);
    }
}
