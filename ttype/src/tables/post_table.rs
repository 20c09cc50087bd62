use crate::error::*;
use crate::tables::{read_i16, read_i32, read_i8, read_u16, read_u32, read_u8};
use crate::writer::ByteWriter;

/// Corresponds to the `post` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/post>
///
/// Versions 1.0 and 3.0 are header-only. Version 2.0 adds the glyph name
/// index plus Pascal-string storage for names beyond the standard set;
/// names are kept as raw bytes. Version 2.5 stores per-glyph i8 offsets
/// into the standard name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTable {
    pub version: u32,
    pub italic_angle: i32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type42: u32,
    pub max_mem_type42: u32,
    pub min_mem_type1: u32,
    pub max_mem_type1: u32,
    pub num_glyphs: u16,
    pub glyph_name_index: Vec<u16>,
    pub glyph_names: Vec<Vec<u8>>,
    pub offsets: Vec<i8>,
}

impl PostTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 32 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::PostTable,
            ));
        }

        let version = read_u32(bytes, 0);

        let mut table = Self {
            version,
            italic_angle: read_i32(bytes, 4),
            underline_position: read_i16(bytes, 8),
            underline_thickness: read_i16(bytes, 10),
            is_fixed_pitch: read_u32(bytes, 12),
            min_mem_type42: read_u32(bytes, 16),
            max_mem_type42: read_u32(bytes, 20),
            min_mem_type1: read_u32(bytes, 24),
            max_mem_type1: read_u32(bytes, 28),
            num_glyphs: 0,
            glyph_name_index: Vec::new(),
            glyph_names: Vec::new(),
            offsets: Vec::new(),
        };

        match version {
            0x00010000 | 0x00030000 => {},
            0x00020000 => {
                if bytes.len() < 34 {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::PostTable,
                    ));
                }

                let num_glyphs = read_u16(bytes, 32) as usize;

                if 34 + (num_glyphs * 2) > bytes.len() {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::PostTable,
                    ));
                }

                table.num_glyphs = num_glyphs as u16;
                table.glyph_name_index = (0..num_glyphs)
                    .map(|i| read_u16(bytes, 34 + (i * 2)))
                    .collect();

                let mut offset = 34 + (num_glyphs * 2);

                while offset < bytes.len() {
                    let length = read_u8(bytes, offset) as usize;
                    offset += 1;

                    if offset + length > bytes.len() {
                        return Err(TtError::Table(
                            TtErrorKind::UnexpectedEof,
                            TtErrorSource::PostTable,
                        ));
                    }

                    table.glyph_names.push(bytes[offset..(offset + length)].to_vec());
                    offset += length;
                }
            },
            0x00025000 => {
                if bytes.len() < 34 {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::PostTable,
                    ));
                }

                let num_glyphs = read_u16(bytes, 32) as usize;

                if 34 + num_glyphs > bytes.len() {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::PostTable,
                    ));
                }

                table.num_glyphs = num_glyphs as u16;
                table.offsets = (0..num_glyphs).map(|i| read_i8(bytes, 34 + i)).collect();
            },
            _ => {
                return Err(TtError::Table(
                    TtErrorKind::UnsupportedTable,
                    TtErrorSource::PostTable,
                ));
            },
        }

        Ok(table)
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.version);
        w.write_i32(self.italic_angle);
        w.write_i16(self.underline_position);
        w.write_i16(self.underline_thickness);
        w.write_u32(self.is_fixed_pitch);
        w.write_u32(self.min_mem_type42);
        w.write_u32(self.max_mem_type42);
        w.write_u32(self.min_mem_type1);
        w.write_u32(self.max_mem_type1);

        match self.version {
            0x00020000 => {
                w.write_u16(self.glyph_name_index.len() as u16);

                for index in &self.glyph_name_index {
                    w.write_u16(*index);
                }

                for name in &self.glyph_names {
                    w.write_u8(name.len() as u8);
                    w.write_bytes(name);
                }
            },
            0x00025000 => {
                w.write_u16(self.offsets.len() as u16);

                for offset in &self.offsets {
                    w.write_i8(*offset);
                }
            },
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version2_round_trip() {
        let table = PostTable {
            version: 0x00020000,
            italic_angle: 0,
            underline_position: -100,
            underline_thickness: 50,
            is_fixed_pitch: 0,
            min_mem_type42: 0,
            max_mem_type42: 0,
            min_mem_type1: 0,
            max_mem_type1: 0,
            num_glyphs: 3,
            glyph_name_index: vec![0, 258, 259],
            glyph_names: vec![b"alpha".to_vec(), b"beta".to_vec()],
            offsets: Vec::new(),
        };

        let mut w = ByteWriter::new();
        table.write(&mut w);

        let reparsed = PostTable::try_parse(&w.into_bytes()).unwrap();
        assert_eq!(reparsed, table);
    }

    #[test]
    fn version3_is_header_only() {
        let table = PostTable {
            version: 0x00030000,
            italic_angle: 0,
            underline_position: 0,
            underline_thickness: 0,
            is_fixed_pitch: 1,
            min_mem_type42: 0,
            max_mem_type42: 0,
            min_mem_type1: 0,
            max_mem_type1: 0,
            num_glyphs: 0,
            glyph_name_index: Vec::new(),
            glyph_names: Vec::new(),
            offsets: Vec::new(),
        };

        let mut w = ByteWriter::new();
        table.write(&mut w);
        let bytes = w.into_bytes();

        assert_eq!(bytes.len(), 32);
        assert_eq!(PostTable::try_parse(&bytes).unwrap(), table);
    }
}
