use crate::error::*;
use crate::tables::{read_i16, read_u16};
use crate::writer::ByteWriter;

/// Corresponds to the `hhea` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HheaTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 36 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::HheaTable,
            ));
        }

        let major_version = read_u16(bytes, 0);
        let minor_version = read_u16(bytes, 2);

        if major_version != 1 || minor_version != 0 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::HheaTable,
            ));
        }

        Ok(Self {
            major_version,
            minor_version,
            ascender: read_i16(bytes, 4),
            descender: read_i16(bytes, 6),
            line_gap: read_i16(bytes, 8),
            advance_width_max: read_u16(bytes, 10),
            min_left_side_bearing: read_i16(bytes, 12),
            min_right_side_bearing: read_i16(bytes, 14),
            x_max_extent: read_i16(bytes, 16),
            caret_slope_rise: read_i16(bytes, 18),
            caret_slope_run: read_i16(bytes, 20),
            caret_offset: read_i16(bytes, 22),
            // 24..32 reserved
            metric_data_format: read_i16(bytes, 32),
            number_of_h_metrics: read_u16(bytes, 34),
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.major_version);
        w.write_u16(self.minor_version);
        w.write_i16(self.ascender);
        w.write_i16(self.descender);
        w.write_i16(self.line_gap);
        w.write_u16(self.advance_width_max);
        w.write_i16(self.min_left_side_bearing);
        w.write_i16(self.min_right_side_bearing);
        w.write_i16(self.x_max_extent);
        w.write_i16(self.caret_slope_rise);
        w.write_i16(self.caret_slope_run);
        w.write_i16(self.caret_offset);

        for _ in 0..4 {
            w.write_i16(0);
        }

        w.write_i16(self.metric_data_format);
        w.write_u16(self.number_of_h_metrics);
    }
}
