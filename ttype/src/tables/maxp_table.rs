use crate::error::*;
use crate::tables::{read_u16, read_u32};
use crate::writer::ByteWriter;

/// Corresponds to the `maxp` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/maxp>
///
/// Version 0.5 carries only `num_glyphs`; the sizing fields below it are
/// zero in that case and are neither read nor written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

impl MaxpTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 6 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::MaxpTable,
            ));
        }

        let version = read_u32(bytes, 0);
        let num_glyphs = read_u16(bytes, 4);

        match version {
            0x00005000 => {
                Ok(Self {
                    version,
                    num_glyphs,
                    max_points: 0,
                    max_contours: 0,
                    max_composite_points: 0,
                    max_composite_contours: 0,
                    max_zones: 0,
                    max_twilight_points: 0,
                    max_storage: 0,
                    max_function_defs: 0,
                    max_instruction_defs: 0,
                    max_stack_elements: 0,
                    max_size_of_instructions: 0,
                    max_component_elements: 0,
                    max_component_depth: 0,
                })
            },
            0x00010000 => {
                if bytes.len() < 32 {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::MaxpTable,
                    ));
                }

                Ok(Self {
                    version,
                    num_glyphs,
                    max_points: read_u16(bytes, 6),
                    max_contours: read_u16(bytes, 8),
                    max_composite_points: read_u16(bytes, 10),
                    max_composite_contours: read_u16(bytes, 12),
                    max_zones: read_u16(bytes, 14),
                    max_twilight_points: read_u16(bytes, 16),
                    max_storage: read_u16(bytes, 18),
                    max_function_defs: read_u16(bytes, 20),
                    max_instruction_defs: read_u16(bytes, 22),
                    max_stack_elements: read_u16(bytes, 24),
                    max_size_of_instructions: read_u16(bytes, 26),
                    max_component_elements: read_u16(bytes, 28),
                    max_component_depth: read_u16(bytes, 30),
                })
            },
            _ => {
                Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::MaxpTable,
                ))
            },
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.version);
        w.write_u16(self.num_glyphs);

        if self.version == 0x00010000 {
            w.write_u16(self.max_points);
            w.write_u16(self.max_contours);
            w.write_u16(self.max_composite_points);
            w.write_u16(self.max_composite_contours);
            w.write_u16(self.max_zones);
            w.write_u16(self.max_twilight_points);
            w.write_u16(self.max_storage);
            w.write_u16(self.max_function_defs);
            w.write_u16(self.max_instruction_defs);
            w.write_u16(self.max_stack_elements);
            w.write_u16(self.max_size_of_instructions);
            w.write_u16(self.max_component_elements);
            w.write_u16(self.max_component_depth);
        }
    }
}
