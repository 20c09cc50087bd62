use crate::error::*;
use crate::tables::{read_i16, LocaTable};
use crate::writer::ByteWriter;

/// Corresponds to the `glyf` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/glyf>
///
/// Glyph descriptions are kept as opaque byte slices, one per glyph index;
/// contour data is never interpreted, which keeps subsetting byte-stable
/// and tolerant of future glyph description extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyfTable {
    pub descs: Vec<GlyphDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphDescription {
    pub raw: Vec<u8>,
}

impl GlyphDescription {
    /// A simple glyph has a non-negative contour count in its leading i16.
    /// Descriptions too short to carry one (including the empty `.notdef`
    /// style entries) count as simple.
    pub fn is_simple(&self) -> bool {
        self.raw.len() < 2 || read_i16(&self.raw, 0) >= 0
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl GlyfTable {
    pub fn try_parse(bytes: &[u8], loca_table: &LocaTable) -> Result<Self, TtError> {
        if loca_table.len() < 2 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::LocaTable,
            ));
        }

        let mut descs = Vec::with_capacity(loca_table.len() - 1);

        for i in 0..(loca_table.len() - 1) {
            let start = loca_table.offset_at(i) as usize;
            let end = loca_table.offset_at(i + 1) as usize;

            if end < start {
                return Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::LocaTable,
                ));
            }

            if end > bytes.len() {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::GlyfTable,
                ));
            }

            descs.push(GlyphDescription {
                raw: bytes[start..end].to_vec(),
            });
        }

        Ok(Self { descs })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        for desc in &self.descs {
            w.write_bytes(&desc.raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminates_simple_and_composite() {
        let simple = GlyphDescription {
            raw: vec![0x00, 0x02, 0, 0, 0, 0, 0, 0, 0, 0],
        };
        let composite = GlyphDescription {
            raw: vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0],
        };
        let empty = GlyphDescription { raw: Vec::new() };

        assert!(simple.is_simple());
        assert!(!composite.is_simple());
        assert!(empty.is_simple());
        assert!(empty.is_empty());
    }

    #[test]
    fn slices_descriptions_by_loca_offsets() {
        // Three glyphs: 4 bytes, empty, 2 bytes.
        let loca = LocaTable::Short(vec![0, 2, 2, 3]);
        let bytes = [1u8, 2, 3, 4, 5, 6];

        let glyf = GlyfTable::try_parse(&bytes, &loca).unwrap();

        assert_eq!(glyf.descs.len(), 3);
        assert_eq!(glyf.descs[0].raw, vec![1, 2, 3, 4]);
        assert!(glyf.descs[1].raw.is_empty());
        assert_eq!(glyf.descs[2].raw, vec![5, 6]);
    }

    #[test]
    fn rejects_decreasing_offsets() {
        let loca = LocaTable::Long(vec![8, 4, 12]);
        let bytes = [0u8; 12];

        assert!(matches!(
            GlyfTable::try_parse(&bytes, &loca),
            Err(TtError::Table(TtErrorKind::InvalidFormat, TtErrorSource::LocaTable))
        ));
    }
}
