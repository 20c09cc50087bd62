use std::collections::BTreeMap;

use log::debug;

use crate::error::*;
use crate::tables::{read_u16, read_u32};
use crate::writer::ByteWriter;
use crate::GlyphIndex;

/// Corresponds to the `cmap` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>
///
/// Subtables are kept in the order their encoding records appear in the
/// file. Subtable formats other than 0, 4, 6 and 12 are skipped at parse
/// time and consequently dropped on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapTable {
    pub version: u16,
    pub subtables: Vec<CmapSubtable>,
}

/// One cmap subtable, keyed by `(platformID, encodingID)`.
///
/// `runes` and `cmap` are caches decoded from the format-specific data:
/// `runes` lists the mapped code points in decoding order and `cmap` maps
/// each code point to its glyph index. Entries that decode to glyph 0 are
/// not cached, so a lookup miss and a `.notdef` mapping are the same thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapSubtable {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub format: SubtableFormat,
    pub runes: Vec<char>,
    pub cmap: BTreeMap<char, GlyphIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtableFormat {
    Format0(CmapFormat0),
    Format4(CmapFormat4),
    Format6(CmapFormat6),
    Format12(CmapFormat12),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat0 {
    pub language: u16,
    pub glyph_id_array: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat4 {
    pub language: u16,
    pub end_code: Vec<u16>,
    pub start_code: Vec<u16>,
    pub id_delta: Vec<i16>,
    pub id_range_offset: Vec<u16>,
    pub glyph_id_data: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat6 {
    pub language: u16,
    pub first_code: u16,
    pub glyph_id_array: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat12 {
    pub language: u32,
    pub groups: Vec<SequentialMapGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl CmapTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 4 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapTable,
            ));
        }

        let version = read_u16(bytes, 0);
        let num_tables = read_u16(bytes, 2) as usize;

        if 4 + (num_tables * 8) > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapTable,
            ));
        }

        let mut subtables = Vec::with_capacity(num_tables);

        for i in 0..num_tables {
            let record_offset = 4 + (i * 8);
            let platform_id = read_u16(bytes, record_offset);
            let encoding_id = read_u16(bytes, record_offset + 2);
            let subtable_offset = read_u32(bytes, record_offset + 4) as usize;

            if subtable_offset + 2 > bytes.len() {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::CmapSubtable,
                ));
            }

            let format = match read_u16(bytes, subtable_offset) {
                0 => SubtableFormat::Format0(CmapFormat0::try_parse(bytes, subtable_offset)?),
                4 => SubtableFormat::Format4(CmapFormat4::try_parse(bytes, subtable_offset)?),
                6 => SubtableFormat::Format6(CmapFormat6::try_parse(bytes, subtable_offset)?),
                12 => SubtableFormat::Format12(CmapFormat12::try_parse(bytes, subtable_offset)?),
                other => {
                    debug!(
                        "skipping cmap subtable ({}, {}) with unsupported format {}",
                        platform_id, encoding_id, other,
                    );
                    continue;
                },
            };

            subtables.push(CmapSubtable::new(platform_id, encoding_id, format));
        }

        Ok(Self { version, subtables })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.version);
        w.write_u16(self.subtables.len() as u16);

        let mut subtable_offset = 4 + (self.subtables.len() * 8);

        for subtable in &self.subtables {
            w.write_u16(subtable.platform_id);
            w.write_u16(subtable.encoding_id);
            w.write_u32(subtable_offset as u32);
            subtable_offset += subtable.byte_len();
        }

        for subtable in &self.subtables {
            subtable.write(w);
        }
    }
}

impl CmapSubtable {
    pub(crate) fn new(platform_id: u16, encoding_id: u16, format: SubtableFormat) -> Self {
        let mut subtable = Self {
            platform_id,
            encoding_id,
            format,
            runes: Vec::new(),
            cmap: BTreeMap::new(),
        };

        subtable.derive_caches();
        subtable
    }

    /// Serialized size in bytes of the format-specific data.
    pub fn byte_len(&self) -> usize {
        match &self.format {
            SubtableFormat::Format0(_) => 262,
            SubtableFormat::Format4(t) => 16 + (8 * t.end_code.len()) + (2 * t.glyph_id_data.len()),
            SubtableFormat::Format6(t) => 10 + (2 * t.glyph_id_array.len()),
            SubtableFormat::Format12(t) => 16 + (12 * t.groups.len()),
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        match &self.format {
            SubtableFormat::Format0(t) => t.write(w),
            SubtableFormat::Format4(t) => t.write(w),
            SubtableFormat::Format6(t) => t.write(w),
            SubtableFormat::Format12(t) => t.write(w),
        }
    }

    /// Rewrites the mapping so that no entry refers to a glyph index at or
    /// above `num_glyphs`. Formats 0 and 6 zero the offending entries;
    /// formats 4 and 12 are regenerated from the decoded `runes` cache,
    /// assigning glyph `i` to `runes[i]` in maximal contiguous runs.
    pub(crate) fn rebuild_for_prefix(&mut self, num_glyphs: usize) {
        match &mut self.format {
            SubtableFormat::Format0(t) => {
                for glyph_id in t.glyph_id_array.iter_mut() {
                    if *glyph_id as usize >= num_glyphs {
                        *glyph_id = 0;
                    }
                }
            },
            SubtableFormat::Format4(t) => {
                let mut end_code = Vec::new();
                let mut start_code = Vec::new();
                let mut id_delta = Vec::new();
                let mut id_range_offset = Vec::new();

                for (start, end, first_glyph) in contiguous_groups(&self.runes, num_glyphs) {
                    start_code.push(start as u16);
                    end_code.push(end as u16);
                    id_delta.push((first_glyph as u16).wrapping_sub(start as u16) as i16);
                    id_range_offset.push(0);
                }

                t.end_code = end_code;
                t.start_code = start_code;
                t.id_delta = id_delta;
                t.id_range_offset = id_range_offset;
                t.glyph_id_data = Vec::new();
            },
            SubtableFormat::Format6(t) => {
                for glyph_id in t.glyph_id_array.iter_mut() {
                    if *glyph_id as usize >= num_glyphs {
                        *glyph_id = 0;
                    }
                }
            },
            SubtableFormat::Format12(t) => {
                t.groups = contiguous_groups(&self.runes, num_glyphs)
                    .into_iter()
                    .map(|(start, end, first_glyph)| {
                        SequentialMapGroup {
                            start_char_code: start,
                            end_char_code: end,
                            start_glyph_id: first_glyph,
                        }
                    })
                    .collect();
            },
        }

        self.derive_caches();
    }

    fn derive_caches(&mut self) {
        let mut runes = Vec::new();
        let mut cmap = BTreeMap::new();

        {
            let mut put = |code: u32, glyph_id: u16| {
                if glyph_id == 0 {
                    return;
                }

                if let Some(c) = char::from_u32(code) {
                    runes.push(c);
                    cmap.insert(c, glyph_id);
                }
            };

            match &self.format {
                SubtableFormat::Format0(t) => {
                    for (code, glyph_id) in t.glyph_id_array.iter().enumerate() {
                        put(code as u32, *glyph_id as u16);
                    }
                },
                SubtableFormat::Format4(t) => {
                    let mut previous_code = None;

                    for i in 0..t.end_code.len() {
                        let mut s = t.start_code[i];
                        let e = t.end_code[i];

                        // Overlapping segments: later segments lose.
                        if let Some(prev) = previous_code {
                            if s <= prev {
                                if prev == u16::MAX {
                                    continue;
                                }

                                s = prev + 1;
                            }
                        }

                        if s > e {
                            continue;
                        }

                        for code in s..=e {
                            put(code as u32, t.glyph_for(i, code));
                        }

                        previous_code = Some(e);
                    }
                },
                SubtableFormat::Format6(t) => {
                    for (i, glyph_id) in t.glyph_id_array.iter().enumerate() {
                        put(t.first_code as u32 + i as u32, *glyph_id);
                    }
                },
                SubtableFormat::Format12(t) => {
                    for group in &t.groups {
                        for code in group.start_char_code..=group.end_char_code {
                            let delta = code - group.start_char_code;
                            put(code, (group.start_glyph_id + delta) as u16);
                        }
                    }
                },
            }
        }

        self.runes = runes;
        self.cmap = cmap;
    }
}

/// Maximal runs over `runes[..num_glyphs]` that are contiguous in both code
/// point and position, as `(startCode, endCode, startGlyphID)` triples.
fn contiguous_groups(runes: &[char], num_glyphs: usize) -> Vec<(u32, u32, u32)> {
    let limit = num_glyphs.min(runes.len());
    let mut groups = Vec::new();
    let mut i = 0;

    while i < limit {
        let mut j = i + 1;

        while j < limit
            && (runes[j] as u32).wrapping_sub(runes[i] as u32) == (j - i) as u32
        {
            j += 1;
        }

        let start = runes[i] as u32;
        groups.push((start, start + (j - i - 1) as u32, i as u32));
        i = j;
    }

    groups
}

fn search_fields(seg_count: usize) -> (u16, u16, u16) {
    if seg_count == 0 {
        return (0, 0, 0);
    }

    let entry_selector = (seg_count as f32).log2().floor() as u32;
    let search_range = 2 * 2u32.pow(entry_selector);
    let range_shift = (seg_count as u32 * 2).saturating_sub(search_range);

    (search_range as u16, entry_selector as u16, range_shift as u16)
}

impl CmapFormat0 {
    pub fn try_parse(bytes: &[u8], base_offset: usize) -> Result<Self, TtError> {
        if base_offset + 262 > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        Ok(Self {
            language: read_u16(bytes, base_offset + 4),
            glyph_id_array: bytes[(base_offset + 6)..(base_offset + 262)].to_vec(),
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(0);
        w.write_u16(262);
        w.write_u16(self.language);
        w.write_bytes(&self.glyph_id_array);
    }
}

impl CmapFormat4 {
    pub fn try_parse(bytes: &[u8], base_offset: usize) -> Result<Self, TtError> {
        if base_offset + 14 > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let length = read_u16(bytes, base_offset + 2) as usize;
        let language = read_u16(bytes, base_offset + 4);
        let seg_count = (read_u16(bytes, base_offset + 6) / 2) as usize;

        let arrays_end = base_offset + 16 + (seg_count * 8);

        if arrays_end > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let end_code_offset = base_offset + 14;
        // One reserved pad u16 sits between endCode and startCode.
        let start_code_offset = end_code_offset + (seg_count * 2) + 2;
        let id_delta_offset = start_code_offset + (seg_count * 2);
        let id_range_offset_offset = id_delta_offset + (seg_count * 2);

        let mut end_code = Vec::with_capacity(seg_count);
        let mut start_code = Vec::with_capacity(seg_count);
        let mut id_delta = Vec::with_capacity(seg_count);
        let mut id_range_offset = Vec::with_capacity(seg_count);

        for i in 0..seg_count {
            end_code.push(read_u16(bytes, end_code_offset + (i * 2)));
            start_code.push(read_u16(bytes, start_code_offset + (i * 2)));
            id_delta.push(read_u16(bytes, id_delta_offset + (i * 2)) as i16);
            id_range_offset.push(read_u16(bytes, id_range_offset_offset + (i * 2)));
        }

        // Subset rebuilds emit delta-only segments without the 0xFFFF
        // sentinel, so its absence is tolerated here.
        if seg_count > 0 && end_code[seg_count - 1] != 0xFFFF {
            debug!("cmap format 4 subtable has no 0xFFFF sentinel segment");
        }

        for i in 0..seg_count {
            if start_code[i] > end_code[i] {
                return Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::CmapSubtable,
                ));
            }
        }

        // Whatever the stated length leaves beyond the four parallel arrays
        // is the glyph ID data that idRangeOffset values point into.
        let subtable_end = (base_offset + length).min(bytes.len());
        let glyph_id_count = subtable_end.saturating_sub(arrays_end) / 2;
        let mut glyph_id_data = Vec::with_capacity(glyph_id_count);

        for i in 0..glyph_id_count {
            glyph_id_data.push(read_u16(bytes, arrays_end + (i * 2)));
        }

        Ok(Self {
            language,
            end_code,
            start_code,
            id_delta,
            id_range_offset,
            glyph_id_data,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        let seg_count = self.end_code.len();
        let length = 16 + (8 * seg_count) + (2 * self.glyph_id_data.len());
        let (search_range, entry_selector, range_shift) = search_fields(seg_count);

        w.write_u16(4);
        w.write_u16(length as u16);
        w.write_u16(self.language);
        w.write_u16(seg_count as u16 * 2);
        w.write_u16(search_range);
        w.write_u16(entry_selector);
        w.write_u16(range_shift);

        for end_code in &self.end_code {
            w.write_u16(*end_code);
        }

        w.write_u16(0);

        for start_code in &self.start_code {
            w.write_u16(*start_code);
        }

        for id_delta in &self.id_delta {
            w.write_i16(*id_delta);
        }

        for id_range_offset in &self.id_range_offset {
            w.write_u16(*id_range_offset);
        }

        for glyph_id in &self.glyph_id_data {
            w.write_u16(*glyph_id);
        }
    }

    /// Resolves `code` (known to lie in `segment`) to a glyph index.
    fn glyph_for(&self, segment: usize, code: u16) -> u16 {
        let delta = self.id_delta[segment] as i32;
        let range_offset = self.id_range_offset[segment];

        if range_offset == 0 {
            return (code as i32 + delta) as u16;
        }

        // idRangeOffset is a byte offset from its own slot into the glyph
        // ID data; rephrased as an index into `glyph_id_data`.
        let seg_count = self.end_code.len();
        let span = (code - self.start_code[segment]) as usize;

        let index = match ((range_offset as usize / 2) + span).checked_sub(seg_count - segment) {
            Some(index) => index,
            None => return 0,
        };

        match self.glyph_id_data.get(index) {
            Some(&0) | None => 0,
            Some(&value) => (value as i32 + delta) as u16,
        }
    }
}

impl CmapFormat6 {
    pub fn try_parse(bytes: &[u8], base_offset: usize) -> Result<Self, TtError> {
        if base_offset + 10 > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let language = read_u16(bytes, base_offset + 4);
        let first_code = read_u16(bytes, base_offset + 6);
        let entry_count = read_u16(bytes, base_offset + 8) as usize;

        if base_offset + 10 + (entry_count * 2) > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let mut glyph_id_array = Vec::with_capacity(entry_count);

        for i in 0..entry_count {
            glyph_id_array.push(read_u16(bytes, base_offset + 10 + (i * 2)));
        }

        Ok(Self {
            language,
            first_code,
            glyph_id_array,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(6);
        w.write_u16((10 + 2 * self.glyph_id_array.len()) as u16);
        w.write_u16(self.language);
        w.write_u16(self.first_code);
        w.write_u16(self.glyph_id_array.len() as u16);

        for glyph_id in &self.glyph_id_array {
            w.write_u16(*glyph_id);
        }
    }
}

impl CmapFormat12 {
    pub fn try_parse(bytes: &[u8], base_offset: usize) -> Result<Self, TtError> {
        if base_offset + 16 > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let language = read_u32(bytes, base_offset + 8);
        let num_groups = read_u32(bytes, base_offset + 12) as usize;

        if 16 + (num_groups as u64 * 12) > (bytes.len() - base_offset) as u64 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::CmapSubtable,
            ));
        }

        let mut groups = Vec::with_capacity(num_groups);
        let mut previous_end = None;

        for i in 0..num_groups {
            let group_offset = base_offset + 16 + (i * 12);

            let group = SequentialMapGroup {
                start_char_code: read_u32(bytes, group_offset),
                end_char_code: read_u32(bytes, group_offset + 4),
                start_glyph_id: read_u32(bytes, group_offset + 8),
            };

            // Groups must be strictly increasing and disjoint.
            if group.end_char_code < group.start_char_code
                || previous_end.is_some_and(|end| group.start_char_code <= end)
            {
                return Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::CmapSubtable,
                ));
            }

            previous_end = Some(group.end_char_code);
            groups.push(group);
        }

        Ok(Self { language, groups })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(12);
        w.write_u16(0);
        w.write_u32((16 + 12 * self.groups.len()) as u32);
        w.write_u32(self.language);
        w.write_u32(self.groups.len() as u32);

        for group in &self.groups {
            w.write_u32(group.start_char_code);
            w.write_u32(group.end_char_code);
            w.write_u32(group.start_glyph_id);
        }
    }
}
