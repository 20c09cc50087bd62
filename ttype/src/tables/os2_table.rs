use crate::error::*;
use crate::tables::{read_i16, read_u16, read_u32};
use crate::writer::ByteWriter;

/// Corresponds to the `OS/2` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/os2>
///
/// Later versions append field groups to the version 0 layout; the groups
/// are optional here and written back only when present, so a font keeps
/// whatever version it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2Table {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range1: u32,
    pub ul_unicode_range2: u32,
    pub ul_unicode_range3: u32,
    pub ul_unicode_range4: u32,
    pub ach_vend_id: [u8; 4],
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,
    pub s_typo_ascender: i16,
    pub s_typo_descender: i16,
    pub s_typo_line_gap: i16,
    pub us_win_ascent: u16,
    pub us_win_descent: u16,
    /// Version 1 and up.
    pub code_page_ranges: Option<(u32, u32)>,
    /// Version 2 and up.
    pub extra: Option<Os2Extra>,
    /// Version 5 only.
    pub optical_point_sizes: Option<(u16, u16)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Os2Extra {
    pub sx_height: i16,
    pub s_cap_height: i16,
    pub us_default_char: u16,
    pub us_break_char: u16,
    pub us_max_context: u16,
}

impl Os2Table {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 78 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::Os2Table,
            ));
        }

        let version = read_u16(bytes, 0);

        if version > 5 {
            return Err(TtError::Table(
                TtErrorKind::UnsupportedTable,
                TtErrorSource::Os2Table,
            ));
        }

        let code_page_ranges = if version >= 1 {
            if bytes.len() < 86 {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::Os2Table,
                ));
            }

            Some((read_u32(bytes, 78), read_u32(bytes, 82)))
        } else {
            None
        };

        let extra = if version >= 2 {
            if bytes.len() < 96 {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::Os2Table,
                ));
            }

            Some(Os2Extra {
                sx_height: read_i16(bytes, 86),
                s_cap_height: read_i16(bytes, 88),
                us_default_char: read_u16(bytes, 90),
                us_break_char: read_u16(bytes, 92),
                us_max_context: read_u16(bytes, 94),
            })
        } else {
            None
        };

        let optical_point_sizes = if version >= 5 {
            if bytes.len() < 100 {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::Os2Table,
                ));
            }

            Some((read_u16(bytes, 96), read_u16(bytes, 98)))
        } else {
            None
        };

        Ok(Self {
            version,
            x_avg_char_width: read_i16(bytes, 2),
            us_weight_class: read_u16(bytes, 4),
            us_width_class: read_u16(bytes, 6),
            fs_type: read_u16(bytes, 8),
            y_subscript_x_size: read_i16(bytes, 10),
            y_subscript_y_size: read_i16(bytes, 12),
            y_subscript_x_offset: read_i16(bytes, 14),
            y_subscript_y_offset: read_i16(bytes, 16),
            y_superscript_x_size: read_i16(bytes, 18),
            y_superscript_y_size: read_i16(bytes, 20),
            y_superscript_x_offset: read_i16(bytes, 22),
            y_superscript_y_offset: read_i16(bytes, 24),
            y_strikeout_size: read_i16(bytes, 26),
            y_strikeout_position: read_i16(bytes, 28),
            s_family_class: read_i16(bytes, 30),
            panose: bytes[32..42].try_into().unwrap(),
            ul_unicode_range1: read_u32(bytes, 42),
            ul_unicode_range2: read_u32(bytes, 46),
            ul_unicode_range3: read_u32(bytes, 50),
            ul_unicode_range4: read_u32(bytes, 54),
            ach_vend_id: bytes[58..62].try_into().unwrap(),
            fs_selection: read_u16(bytes, 62),
            us_first_char_index: read_u16(bytes, 64),
            us_last_char_index: read_u16(bytes, 66),
            s_typo_ascender: read_i16(bytes, 68),
            s_typo_descender: read_i16(bytes, 70),
            s_typo_line_gap: read_i16(bytes, 72),
            us_win_ascent: read_u16(bytes, 74),
            us_win_descent: read_u16(bytes, 76),
            code_page_ranges,
            extra,
            optical_point_sizes,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.version);
        w.write_i16(self.x_avg_char_width);
        w.write_u16(self.us_weight_class);
        w.write_u16(self.us_width_class);
        w.write_u16(self.fs_type);
        w.write_i16(self.y_subscript_x_size);
        w.write_i16(self.y_subscript_y_size);
        w.write_i16(self.y_subscript_x_offset);
        w.write_i16(self.y_subscript_y_offset);
        w.write_i16(self.y_superscript_x_size);
        w.write_i16(self.y_superscript_y_size);
        w.write_i16(self.y_superscript_x_offset);
        w.write_i16(self.y_superscript_y_offset);
        w.write_i16(self.y_strikeout_size);
        w.write_i16(self.y_strikeout_position);
        w.write_i16(self.s_family_class);
        w.write_bytes(&self.panose);
        w.write_u32(self.ul_unicode_range1);
        w.write_u32(self.ul_unicode_range2);
        w.write_u32(self.ul_unicode_range3);
        w.write_u32(self.ul_unicode_range4);
        w.write_bytes(&self.ach_vend_id);
        w.write_u16(self.fs_selection);
        w.write_u16(self.us_first_char_index);
        w.write_u16(self.us_last_char_index);
        w.write_i16(self.s_typo_ascender);
        w.write_i16(self.s_typo_descender);
        w.write_i16(self.s_typo_line_gap);
        w.write_u16(self.us_win_ascent);
        w.write_u16(self.us_win_descent);

        if let Some((range1, range2)) = self.code_page_ranges {
            w.write_u32(range1);
            w.write_u32(range2);
        }

        if let Some(extra) = self.extra {
            w.write_i16(extra.sx_height);
            w.write_i16(extra.s_cap_height);
            w.write_u16(extra.us_default_char);
            w.write_u16(extra.us_break_char);
            w.write_u16(extra.us_max_context);
        }

        if let Some((lower, upper)) = self.optical_point_sizes {
            w.write_u16(lower);
            w.write_u16(upper);
        }
    }
}
