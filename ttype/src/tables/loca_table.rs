use crate::error::*;
use crate::tables::{read_u16, read_u32, HeadTable, MaxpTable};
use crate::writer::ByteWriter;

/// Corresponds to the `loca` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/loca>
///
/// The short form stores `offset / 2` in a u16 per entry; values here are
/// kept in stored form and scaled by [`LocaTable::offset_at`]. The form in
/// use is governed by `head.indexToLocFormat` and holds `numGlyphs + 1`
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaTable {
    Short(Vec<u16>),
    Long(Vec<u32>),
}

impl LocaTable {
    pub fn try_parse(
        bytes: &[u8],
        head_table: &HeadTable,
        maxp_table: &MaxpTable,
    ) -> Result<Self, TtError> {
        let num_glyphs = maxp_table.num_glyphs as usize;

        match head_table.index_to_loc_format {
            0 => {
                if (num_glyphs + 1) * 2 > bytes.len() {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::LocaTable,
                    ));
                }

                let mut offsets = Vec::with_capacity(num_glyphs + 1);

                for i in 0..=num_glyphs {
                    offsets.push(read_u16(bytes, i * 2));
                }

                Ok(Self::Short(offsets))
            },
            1 => {
                if (num_glyphs + 1) * 4 > bytes.len() {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::LocaTable,
                    ));
                }

                let mut offsets = Vec::with_capacity(num_glyphs + 1);

                for i in 0..=num_glyphs {
                    offsets.push(read_u32(bytes, i * 4));
                }

                Ok(Self::Long(offsets))
            },
            _ => {
                Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::LocaTable,
                ))
            },
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        match self {
            Self::Short(offsets) => {
                for offset in offsets {
                    w.write_u16(*offset);
                }
            },
            Self::Long(offsets) => {
                for offset in offsets {
                    w.write_u32(*offset);
                }
            },
        }
    }

    /// Number of entries (one more than the glyph count).
    pub fn len(&self) -> usize {
        match self {
            Self::Short(offsets) => offsets.len(),
            Self::Long(offsets) => offsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real byte offset of glyph `i` within the glyf table.
    pub fn offset_at(&self, i: usize) -> u32 {
        match self {
            Self::Short(offsets) => offsets[i] as u32 * 2,
            Self::Long(offsets) => offsets[i],
        }
    }
}
