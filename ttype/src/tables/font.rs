use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::*;
use crate::tables::{
    table_tag, CmapTable, CvtTable, GlyfTable, HeadTable, HheaTable, HmtxTable, LocaTable,
    MaxpTable, NameTable, OffsetTable, Os2Table, PostTable, PrepTable, TableRecord,
};
use crate::writer::{checksum, ByteWriter};
use crate::GlyphIndex;

/// The file-level checksum identity: `checkSumAdjustment` is chosen so the
/// whole file sums to this constant.
pub(crate) const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// A parsed (or subsetted) TrueType font.
///
/// Owns a typed value per supported table; tables absent from the source
/// file stay `None`. Tables with tags outside the supported set are ignored
/// at parse time and consequently not written back. No method mutates a
/// font in place; the subsetters return new fonts.
#[derive(Debug, Clone)]
pub struct Font {
    pub(crate) scaler_type: u32,
    pub(crate) records: Vec<TableRecord>,
    pub(crate) head: Option<HeadTable>,
    pub(crate) maxp: Option<MaxpTable>,
    pub(crate) hhea: Option<HheaTable>,
    pub(crate) hmtx: Option<HmtxTable>,
    pub(crate) loca: Option<LocaTable>,
    pub(crate) glyf: Option<GlyfTable>,
    pub(crate) cmap: Option<CmapTable>,
    pub(crate) name: Option<NameTable>,
    pub(crate) post: Option<PostTable>,
    pub(crate) os2: Option<Os2Table>,
    pub(crate) cvt: Option<CvtTable>,
    pub(crate) prep: Option<PrepTable>,
}

fn table_slice<'a>(
    bytes: &'a [u8],
    record: &TableRecord,
    source: TtErrorSource,
) -> Result<&'a [u8], TtError> {
    let start = record.offset as usize;
    let end = start + record.length as usize;

    if end > bytes.len() {
        return Err(TtError::Table(TtErrorKind::UnexpectedEof, source));
    }

    Ok(&bytes[start..end])
}

impl Font {
    /// Parses a font from raw sfnt bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, TtError> {
        let offset_table = OffsetTable::try_parse(bytes)?;
        let num_tables = offset_table.num_tables as usize;

        if 12 + (num_tables * 16) > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::OffsetTable,
            ));
        }

        let mut records = Vec::with_capacity(num_tables);

        for i in 0..num_tables {
            records.push(TableRecord::try_parse(bytes, 12 + (i * 16))?);
        }

        let mut head_record = None;
        let mut maxp_record = None;
        let mut hhea_record = None;
        let mut hmtx_record = None;
        let mut loca_record = None;
        let mut glyf_record = None;
        let mut cmap_record = None;
        let mut name_record = None;
        let mut post_record = None;
        let mut os2_record = None;
        let mut cvt_record = None;
        let mut prep_record = None;

        for record in &records {
            match record.table_tag {
                table_tag::HEAD => head_record = Some(*record),
                table_tag::MAXP => maxp_record = Some(*record),
                table_tag::HHEA => hhea_record = Some(*record),
                table_tag::HMTX => hmtx_record = Some(*record),
                table_tag::LOCA => loca_record = Some(*record),
                table_tag::GLYF => glyf_record = Some(*record),
                table_tag::CMAP => cmap_record = Some(*record),
                table_tag::NAME => name_record = Some(*record),
                table_tag::POST => post_record = Some(*record),
                table_tag::OS2 => os2_record = Some(*record),
                table_tag::CVT => cvt_record = Some(*record),
                table_tag::PREP => prep_record = Some(*record),
                _ => (),
            }
        }

        let head = match &head_record {
            Some(record) => {
                Some(HeadTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::HeadTable,
                )?)?)
            },
            None => None,
        };

        let maxp = match &maxp_record {
            Some(record) => {
                Some(MaxpTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::MaxpTable,
                )?)?)
            },
            None => None,
        };

        let hhea = match &hhea_record {
            Some(record) => {
                Some(HheaTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::HheaTable,
                )?)?)
            },
            None => None,
        };

        let hmtx = match &hmtx_record {
            Some(record) => {
                match (&maxp, &hhea) {
                    (Some(maxp), Some(hhea)) => {
                        Some(HmtxTable::try_parse(
                            table_slice(bytes, record, TtErrorSource::HmtxTable)?,
                            maxp,
                            hhea,
                        )?)
                    },
                    _ => {
                        return Err(TtError::Table(
                            TtErrorKind::InvalidFormat,
                            TtErrorSource::HmtxTable,
                        ));
                    },
                }
            },
            None => None,
        };

        let loca = match &loca_record {
            Some(record) => {
                match (&head, &maxp) {
                    (Some(head), Some(maxp)) => {
                        Some(LocaTable::try_parse(
                            table_slice(bytes, record, TtErrorSource::LocaTable)?,
                            head,
                            maxp,
                        )?)
                    },
                    _ => {
                        return Err(TtError::Table(
                            TtErrorKind::InvalidFormat,
                            TtErrorSource::LocaTable,
                        ));
                    },
                }
            },
            None => None,
        };

        let glyf = match &glyf_record {
            Some(record) => {
                match &loca {
                    Some(loca) => {
                        Some(GlyfTable::try_parse(
                            table_slice(bytes, record, TtErrorSource::GlyfTable)?,
                            loca,
                        )?)
                    },
                    None => {
                        return Err(TtError::Table(
                            TtErrorKind::InvalidFormat,
                            TtErrorSource::GlyfTable,
                        ));
                    },
                }
            },
            None => None,
        };

        let cmap = match &cmap_record {
            Some(record) => {
                Some(CmapTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::CmapTable,
                )?)?)
            },
            None => None,
        };

        let name = match &name_record {
            Some(record) => {
                Some(NameTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::NameTable,
                )?)?)
            },
            None => None,
        };

        let post = match &post_record {
            Some(record) => {
                Some(PostTable::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::PostTable,
                )?)?)
            },
            None => None,
        };

        let os2 = match &os2_record {
            Some(record) => {
                Some(Os2Table::try_parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::Os2Table,
                )?)?)
            },
            None => None,
        };

        let cvt = match &cvt_record {
            Some(record) => {
                Some(CvtTable::parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::CvtTable,
                )?))
            },
            None => None,
        };

        let prep = match &prep_record {
            Some(record) => {
                Some(PrepTable::parse(table_slice(
                    bytes,
                    record,
                    TtErrorSource::PrepTable,
                )?))
            },
            None => None,
        };

        Ok(Self {
            scaler_type: offset_table.scaler_type,
            records,
            head,
            maxp,
            hhea,
            hmtx,
            loca,
            glyf,
            cmap,
            name,
            post,
            os2,
            cvt,
            prep,
        })
    }

    /// Parses a font from the file at `path`.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, TtError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// The character-to-glyph map of the subtable keyed by `platform_id`
    /// and `encoding_id`, or `None` if the font has no such subtable.
    pub fn get_cmap(
        &self,
        platform_id: u16,
        encoding_id: u16,
    ) -> Option<&BTreeMap<char, GlyphIndex>> {
        let cmap = self.cmap.as_ref()?;

        cmap.subtables
            .iter()
            .find(|s| s.platform_id == platform_id && s.encoding_id == encoding_id)
            .map(|s| &s.cmap)
    }

    /// Glyph count from `maxp`, or zero when the table is absent.
    pub fn num_glyphs(&self) -> u16 {
        self.maxp.as_ref().map(|maxp| maxp.num_glyphs).unwrap_or(0)
    }

    pub fn head_table(&self) -> Option<&HeadTable> {
        self.head.as_ref()
    }

    pub fn maxp_table(&self) -> Option<&MaxpTable> {
        self.maxp.as_ref()
    }

    pub fn hhea_table(&self) -> Option<&HheaTable> {
        self.hhea.as_ref()
    }

    pub fn hmtx_table(&self) -> Option<&HmtxTable> {
        self.hmtx.as_ref()
    }

    pub fn loca_table(&self) -> Option<&LocaTable> {
        self.loca.as_ref()
    }

    pub fn glyf_table(&self) -> Option<&GlyfTable> {
        self.glyf.as_ref()
    }

    pub fn cmap_table(&self) -> Option<&CmapTable> {
        self.cmap.as_ref()
    }

    pub fn name_table(&self) -> Option<&NameTable> {
        self.name.as_ref()
    }

    pub fn post_table(&self) -> Option<&PostTable> {
        self.post.as_ref()
    }

    pub fn os2_table(&self) -> Option<&Os2Table> {
        self.os2.as_ref()
    }

    pub fn cvt_table(&self) -> Option<&CvtTable> {
        self.cvt.as_ref()
    }

    pub fn prep_table(&self) -> Option<&PrepTable> {
        self.prep.as_ref()
    }

    /// Serializes the font and writes it to `writer`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), TtError> {
        let bytes = self.to_vec();
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Serializes the font to the file at `path`.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TtError> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serializes the font to bytes.
    ///
    /// Tables are laid out in a fixed order with 4-byte padding between
    /// them; the directory is emitted tag-ascending. Output is a pure
    /// function of the font value. The `head` checksum adjustment is
    /// patched last so the whole file sums to the checksum magic.
    pub fn to_vec(&self) -> Vec<u8> {
        fn table_bytes(write: impl FnOnce(&mut ByteWriter)) -> Vec<u8> {
            let mut w = ByteWriter::new();
            write(&mut w);
            w.into_bytes()
        }

        let mut tables: Vec<(u32, Vec<u8>)> = Vec::new();

        if let Some(head) = &self.head {
            tables.push((table_tag::HEAD, table_bytes(|w| head.write(w))));
        }

        if let Some(hhea) = &self.hhea {
            tables.push((table_tag::HHEA, table_bytes(|w| hhea.write(w))));
        }

        if let Some(maxp) = &self.maxp {
            tables.push((table_tag::MAXP, table_bytes(|w| maxp.write(w))));
        }

        if let Some(os2) = &self.os2 {
            tables.push((table_tag::OS2, table_bytes(|w| os2.write(w))));
        }

        if let Some(hmtx) = &self.hmtx {
            tables.push((table_tag::HMTX, table_bytes(|w| hmtx.write(w))));
        }

        if let Some(cmap) = &self.cmap {
            tables.push((table_tag::CMAP, table_bytes(|w| cmap.write(w))));
        }

        if let Some(cvt) = &self.cvt {
            tables.push((table_tag::CVT, table_bytes(|w| cvt.write(w))));
        }

        if let Some(prep) = &self.prep {
            tables.push((table_tag::PREP, table_bytes(|w| prep.write(w))));
        }

        if let Some(loca) = &self.loca {
            tables.push((table_tag::LOCA, table_bytes(|w| loca.write(w))));
        }

        if let Some(glyf) = &self.glyf {
            tables.push((table_tag::GLYF, table_bytes(|w| glyf.write(w))));
        }

        if let Some(name) = &self.name {
            tables.push((table_tag::NAME, table_bytes(|w| name.write(w))));
        }

        if let Some(post) = &self.post {
            tables.push((table_tag::POST, table_bytes(|w| post.write(w))));
        }

        let directory_len = 12 + (16 * tables.len());
        let mut records = Vec::with_capacity(tables.len());
        let mut offset = directory_len;
        let mut head_offset = None;

        for (tag, data) in &tables {
            if *tag == table_tag::HEAD {
                head_offset = Some(offset);
            }

            records.push(TableRecord {
                table_tag: *tag,
                checksum: checksum(data),
                offset: offset as u32,
                length: data.len() as u32,
            });

            offset += data.len();
            offset = (offset + 3) & !3;
        }

        records.sort_by_key(|record| record.table_tag);

        let mut w = ByteWriter::new();
        OffsetTable::new(self.scaler_type, tables.len() as u16).write(&mut w);

        for record in &records {
            record.write(&mut w);
        }

        for (_, data) in &tables {
            w.write_bytes(data);
            w.align4();
        }

        // The serialized head carries a zero adjustment up to this point.
        if let Some(head_offset) = head_offset {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(w.as_bytes()));
            w.patch_u32(head_offset + 8, adjustment);
        }

        w.into_bytes()
    }
}

#[cfg(test)]
pub(crate) mod test_font {
    use super::*;
    use crate::tables::cmap_table::{CmapFormat0, CmapFormat4, CmapSubtable, SubtableFormat};
    use crate::tables::hmtx_table::HorMetric;
    use crate::tables::name_table::NameRecord;

    /// A four-glyph font: .notdef (empty), two simple glyphs and one
    /// composite, mapped as 'A'..'C' -> 1..3 in the (3,1) subtable and
    /// 'a' -> 1, 'b' -> 3 in the (1,0) subtable.
    pub fn sample() -> Font {
        let glyph1 = vec![0x00, 0x01, 0, 10, 0, 10, 0, 90, 0, 90, 0, 0];
        let glyph2 = vec![0x00, 0x01, 0, 20, 0, 20, 0, 80, 0, 80, 0, 0, 0, 0, 0, 0];
        let glyph3 = vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 50, 0, 50, 0, 0x20, 0, 1];

        let mut loca_short = vec![0u16, 0];

        for raw in [&glyph1, &glyph2, &glyph3] {
            loca_short.push(loca_short.last().unwrap() + (raw.len() as u16 / 2));
        }

        let format4 = CmapFormat4 {
            language: 0,
            end_code: vec![0x43, 0xFFFF],
            start_code: vec![0x41, 0xFFFF],
            id_delta: vec![-0x40, 1],
            id_range_offset: vec![0, 0],
            glyph_id_data: Vec::new(),
        };

        let mut mac_roman = vec![0u8; 256];
        mac_roman[0x61] = 1;
        mac_roman[0x62] = 3;

        let format0 = CmapFormat0 {
            language: 0,
            glyph_id_array: mac_roman,
        };

        Font {
            scaler_type: 0x00010000,
            records: Vec::new(),
            head: Some(HeadTable {
                major_version: 1,
                minor_version: 0,
                font_revision: 0x00010000,
                checksum_adjustment: 0,
                magic_number: crate::tables::head_table::HEAD_MAGIC,
                flags: 0x000B,
                units_per_em: 1000,
                created: 3_500_000_000,
                modified: 3_500_000_123,
                x_min: 0,
                y_min: -200,
                x_max: 900,
                y_max: 800,
                mac_style: 0,
                lowest_rec_ppem: 8,
                font_direction_hint: 2,
                index_to_loc_format: 0,
                glyph_data_format: 0,
            }),
            maxp: Some(MaxpTable {
                version: 0x00010000,
                num_glyphs: 4,
                max_points: 16,
                max_contours: 2,
                max_composite_points: 16,
                max_composite_contours: 2,
                max_zones: 2,
                max_twilight_points: 0,
                max_storage: 0,
                max_function_defs: 0,
                max_instruction_defs: 0,
                max_stack_elements: 0,
                max_size_of_instructions: 0,
                max_component_elements: 1,
                max_component_depth: 1,
            }),
            hhea: Some(HheaTable {
                major_version: 1,
                minor_version: 0,
                ascender: 800,
                descender: -200,
                line_gap: 90,
                advance_width_max: 600,
                min_left_side_bearing: 10,
                min_right_side_bearing: 10,
                x_max_extent: 900,
                caret_slope_rise: 1,
                caret_slope_run: 0,
                caret_offset: 0,
                metric_data_format: 0,
                number_of_h_metrics: 4,
            }),
            hmtx: Some(HmtxTable {
                h_metrics: vec![
                    HorMetric { advance_width: 600, lsb: 10 },
                    HorMetric { advance_width: 550, lsb: 20 },
                    HorMetric { advance_width: 500, lsb: 30 },
                    HorMetric { advance_width: 450, lsb: 40 },
                ],
                left_side_bearings: Vec::new(),
            }),
            loca: Some(LocaTable::Short(loca_short)),
            glyf: Some(GlyfTable {
                descs: vec![
                    crate::tables::GlyphDescription { raw: Vec::new() },
                    crate::tables::GlyphDescription { raw: glyph1 },
                    crate::tables::GlyphDescription { raw: glyph2 },
                    crate::tables::GlyphDescription { raw: glyph3 },
                ],
            }),
            cmap: Some(CmapTable {
                version: 0,
                subtables: vec![
                    CmapSubtable::new(3, 1, SubtableFormat::Format4(format4)),
                    CmapSubtable::new(1, 0, SubtableFormat::Format0(format0)),
                ],
            }),
            name: Some(NameTable {
                version: 0,
                name_records: vec![NameRecord {
                    platform_id: 3,
                    encoding_id: 1,
                    language_id: 0x0409,
                    name_id: 1,
                    data: "Sample".encode_utf16().flat_map(|c| c.to_be_bytes()).collect(),
                }],
                lang_tags: Vec::new(),
            }),
            post: Some(PostTable {
                version: 0x00030000,
                italic_angle: 0,
                underline_position: -75,
                underline_thickness: 50,
                is_fixed_pitch: 0,
                min_mem_type42: 0,
                max_mem_type42: 0,
                min_mem_type1: 0,
                max_mem_type1: 0,
                num_glyphs: 0,
                glyph_name_index: Vec::new(),
                glyph_names: Vec::new(),
                offsets: Vec::new(),
            }),
            os2: Some(Os2Table {
                version: 1,
                x_avg_char_width: 520,
                us_weight_class: 400,
                us_width_class: 5,
                fs_type: 0,
                y_subscript_x_size: 650,
                y_subscript_y_size: 600,
                y_subscript_x_offset: 0,
                y_subscript_y_offset: 75,
                y_superscript_x_size: 650,
                y_superscript_y_size: 600,
                y_superscript_x_offset: 0,
                y_superscript_y_offset: 350,
                y_strikeout_size: 50,
                y_strikeout_position: 250,
                s_family_class: 0,
                panose: [2, 0, 5, 3, 0, 0, 0, 0, 0, 0],
                ul_unicode_range1: 1,
                ul_unicode_range2: 0,
                ul_unicode_range3: 0,
                ul_unicode_range4: 0,
                ach_vend_id: *b"NONE",
                fs_selection: 0x0040,
                us_first_char_index: 0x41,
                us_last_char_index: 0x43,
                s_typo_ascender: 800,
                s_typo_descender: -200,
                s_typo_line_gap: 90,
                us_win_ascent: 800,
                us_win_descent: 200,
                code_page_ranges: Some((1, 0)),
                extra: None,
                optical_point_sizes: None,
            }),
            cvt: Some(CvtTable {
                values: vec![12, -5, 40],
            }),
            prep: Some(PrepTable {
                instructions: vec![0xB0, 0x01, 0x18],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_font::sample;
    use super::*;

    #[test]
    fn round_trip_preserves_tables() {
        let font = sample();
        let bytes = font.to_vec();
        let reparsed = Font::parse(&bytes).unwrap();

        // head survives except for the adjustment, which the serializer
        // recomputes for the new layout.
        let mut head = reparsed.head.clone().unwrap();
        head.checksum_adjustment = 0;
        assert_eq!(Some(head), font.head);

        assert_eq!(reparsed.maxp, font.maxp);
        assert_eq!(reparsed.hhea, font.hhea);
        assert_eq!(reparsed.hmtx, font.hmtx);
        assert_eq!(reparsed.loca, font.loca);
        assert_eq!(reparsed.glyf, font.glyf);
        assert_eq!(reparsed.cmap, font.cmap);
        assert_eq!(reparsed.name, font.name);
        assert_eq!(reparsed.post, font.post);
        assert_eq!(reparsed.os2, font.os2);
        assert_eq!(reparsed.cvt, font.cvt);
        assert_eq!(reparsed.prep, font.prep);
    }

    #[test]
    fn write_is_deterministic() {
        let font = sample();
        assert_eq!(font.to_vec(), font.to_vec());
    }

    #[test]
    fn directory_is_tag_ascending() {
        let bytes = sample().to_vec();
        let reparsed = Font::parse(&bytes).unwrap();

        assert_eq!(reparsed.records.len(), 12);
        assert!(reparsed.records.windows(2).all(|w| w[0].table_tag < w[1].table_tag));
    }

    #[test]
    fn tables_are_four_byte_aligned() {
        let bytes = sample().to_vec();
        let reparsed = Font::parse(&bytes).unwrap();

        for record in &reparsed.records {
            assert_eq!(record.offset % 4, 0, "table at unaligned offset");
        }
    }

    #[test]
    fn glyph_counts_are_consistent() {
        let bytes = sample().to_vec();
        let font = Font::parse(&bytes).unwrap();

        let num_glyphs = font.num_glyphs() as usize;
        assert_eq!(font.glyf.as_ref().unwrap().descs.len(), num_glyphs);
        assert_eq!(font.loca.as_ref().unwrap().len(), num_glyphs + 1);
        assert_eq!(font.hmtx.as_ref().unwrap().num_entries(), num_glyphs);
    }

    #[test]
    fn loca_offsets_match_glyph_lengths() {
        let font = sample();
        let loca = font.loca.as_ref().unwrap();
        let glyf = font.glyf.as_ref().unwrap();

        for (i, desc) in glyf.descs.iter().enumerate() {
            assert_eq!(
                loca.offset_at(i + 1) - loca.offset_at(i),
                desc.raw.len() as u32,
            );
        }
    }

    #[test]
    fn get_cmap_finds_subtables_by_key() {
        let font = sample();

        let windows = font.get_cmap(3, 1).unwrap();
        assert_eq!(windows.get(&'A'), Some(&1));

        let mac = font.get_cmap(1, 0).unwrap();
        assert_eq!(mac.get(&'a'), Some(&1));

        assert!(font.get_cmap(0, 3).is_none());
    }

    #[test]
    fn unknown_tables_are_dropped_on_write() {
        let bytes = sample().to_vec();
        let font = Font::parse(&bytes).unwrap();

        // All twelve supported tables survive; nothing else appears.
        let rewritten = Font::parse(&font.to_vec()).unwrap();
        assert_eq!(rewritten.records.len(), 12);
    }
}
