//! Subsetting: derive a reduced font from a parsed one.
//!
//! All three entry points clone the source font and mutate the clone; the
//! original is never touched. Input errors are raised before any cloning.

use std::collections::HashSet;

use log::debug;

use crate::error::*;
use crate::tables::{Font, GlyfTable, LocaTable};
use crate::GlyphIndex;

impl Font {
    /// Prunes glyph data for every glyph that no rune in `runes` maps to,
    /// keeping the glyph-index space intact.
    ///
    /// Runes are resolved against the cmap subtables in the fixed order
    /// (3,1), (1,0), (0,3); the first subtable that maps a rune wins. A
    /// rune that resolves to no glyph (or only to `.notdef`) is fatal.
    pub fn subset_keep_runes(&self, runes: &[char]) -> Result<Font, TtError> {
        let maps = [self.get_cmap(3, 1), self.get_cmap(1, 0), self.get_cmap(0, 3)];
        let mut indices = Vec::with_capacity(runes.len());

        for rune in runes {
            let mut index = 0;

            for map in maps.iter().flatten() {
                if let Some(glyph_id) = map.get(rune) {
                    index = *glyph_id;
                    break;
                }
            }

            if index == 0 {
                debug!("no glyph for rune {:?} in the preferred cmap subtables", rune);

                return Err(TtError::Table(
                    TtErrorKind::RuneNotFound,
                    TtErrorSource::Subsetter,
                ));
            }

            indices.push(index);
        }

        debug!("runes {:?} resolved to glyph indices {:?}", runes, indices);
        self.subset_keep_indices(&indices)
    }

    /// Prunes glyph data for every glyph index outside `indices`. The
    /// glyph-index space is kept intact, so glyph references elsewhere in
    /// a document stay valid; the glyf table simply loses the outlines of
    /// pruned glyphs.
    ///
    /// Composite glyphs are retained even when not listed, since their
    /// component glyphs are not tracked here and emptying them could not
    /// be compensated for.
    pub fn subset_keep_indices(&self, indices: &[GlyphIndex]) -> Result<Font, TtError> {
        let included: HashSet<GlyphIndex> = indices.iter().copied().collect();
        let mut font = self.clone();

        let rebuilt_loca = match (&mut font.glyf, &font.loca) {
            (Some(glyf), Some(loca)) => {
                for (i, desc) in glyf.descs.iter_mut().enumerate() {
                    if included.contains(&(i as GlyphIndex)) {
                        continue;
                    }

                    if desc.is_simple() {
                        desc.raw = Vec::new();
                    }
                }

                Some(rebuild_loca(loca, glyf))
            },
            _ => None,
        };

        if let Some(loca) = rebuilt_loca {
            font.loca = Some(loca);
        }

        if let Some(hmtx) = &mut font.hmtx {
            let number_of_h_metrics = hmtx.optimize();

            if let Some(hhea) = &mut font.hhea {
                hhea.number_of_h_metrics = number_of_h_metrics;
            }
        }

        Ok(font)
    }

    /// Keeps only the first `num_glyphs` glyph indices, truncating every
    /// per-glyph table to match and regenerating the cmap subtables over
    /// the retained prefix.
    ///
    /// Composite glyphs inside the prefix lose their data, since their
    /// components may lie beyond it. Fails with `Redundant` when the font
    /// does not have more than `num_glyphs` glyphs.
    pub fn subset_simple(&self, num_glyphs: usize) -> Result<Font, TtError> {
        let maxp = match &self.maxp {
            Some(maxp) => maxp,
            None => {
                return Err(TtError::Table(
                    TtErrorKind::InvalidFormat,
                    TtErrorSource::MaxpTable,
                ));
            },
        };

        if num_glyphs >= maxp.num_glyphs as usize {
            return Err(TtError::Table(
                TtErrorKind::Redundant,
                TtErrorSource::Subsetter,
            ));
        }

        let mut font = self.clone();

        if let Some(maxp) = &mut font.maxp {
            maxp.num_glyphs = num_glyphs as u16;
        }

        if let Some(hhea) = &mut font.hhea {
            if hhea.number_of_h_metrics > num_glyphs as u16 {
                hhea.number_of_h_metrics = num_glyphs as u16;
            }
        }

        if let Some(hmtx) = &mut font.hmtx {
            if hmtx.h_metrics.len() > num_glyphs {
                hmtx.h_metrics.truncate(num_glyphs);
                hmtx.left_side_bearings.clear();
            } else {
                let keep = (num_glyphs - hmtx.h_metrics.len()).min(hmtx.left_side_bearings.len());
                hmtx.left_side_bearings.truncate(keep);
            }

            let number_of_h_metrics = hmtx.optimize();

            if let Some(hhea) = &mut font.hhea {
                hhea.number_of_h_metrics = number_of_h_metrics;
            }
        }

        let rebuilt_loca = match (&mut font.glyf, &font.loca) {
            (Some(glyf), Some(loca)) => {
                glyf.descs.truncate(num_glyphs);

                for desc in glyf.descs.iter_mut() {
                    if !desc.is_simple() {
                        desc.raw = Vec::new();
                    }
                }

                Some(rebuild_loca(loca, glyf))
            },
            _ => None,
        };

        if let Some(loca) = rebuilt_loca {
            font.loca = Some(loca);
        }

        if let Some(post) = &mut font.post {
            if post.num_glyphs > 0 {
                post.num_glyphs = num_glyphs as u16;
            }

            post.glyph_name_index.truncate(num_glyphs);
            post.glyph_names.truncate(num_glyphs);
            post.offsets.truncate(num_glyphs);
        }

        if let Some(cmap) = &mut font.cmap {
            for subtable in &mut cmap.subtables {
                subtable.rebuild_for_prefix(num_glyphs);
            }
        }

        Ok(font)
    }
}

/// Recomputes loca from the actual glyph description lengths, keeping the
/// original form and first offset. Entry `i + 1` advances by the stored
/// length of glyph `i` (halved in the short form).
fn rebuild_loca(loca: &LocaTable, glyf: &GlyfTable) -> LocaTable {
    match loca {
        LocaTable::Short(offsets) => {
            let mut offset = offsets.first().copied().unwrap_or(0);
            let mut rebuilt = Vec::with_capacity(glyf.descs.len() + 1);
            rebuilt.push(offset);

            for desc in &glyf.descs {
                offset += desc.raw.len() as u16 / 2;
                rebuilt.push(offset);
            }

            LocaTable::Short(rebuilt)
        },
        LocaTable::Long(offsets) => {
            let mut offset = offsets.first().copied().unwrap_or(0);
            let mut rebuilt = Vec::with_capacity(glyf.descs.len() + 1);
            rebuilt.push(offset);

            for desc in &glyf.descs {
                offset += desc.raw.len() as u32;
                rebuilt.push(offset);
            }

            LocaTable::Long(rebuilt)
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::error::*;
    use crate::tables::font::test_font::sample;
    use crate::tables::{Font, SubtableFormat};
    use crate::validate_bytes;

    #[test]
    fn keep_indices_preserves_gid_space() {
        let font = sample();
        let subset = font.subset_keep_indices(&[1]).unwrap();

        assert_eq!(subset.num_glyphs(), font.num_glyphs());

        let descs = &subset.glyf_table().unwrap().descs;
        let original = &font.glyf_table().unwrap().descs;

        assert_eq!(descs[1], original[1]);
        assert!(descs[2].raw.is_empty(), "pruned simple glyph keeps data");
        assert_eq!(descs[3], original[3], "composite glyph was pruned");

        // The original font is untouched.
        assert!(!font.glyf_table().unwrap().descs[2].raw.is_empty());
    }

    #[test]
    fn keep_indices_rebuilds_loca() {
        let subset = sample().subset_keep_indices(&[1]).unwrap();

        let loca = subset.loca_table().unwrap();
        let descs = &subset.glyf_table().unwrap().descs;

        assert_eq!(loca.len(), descs.len() + 1);

        for (i, desc) in descs.iter().enumerate() {
            assert_eq!(loca.offset_at(i + 1) - loca.offset_at(i), desc.raw.len() as u32);
        }
    }

    #[test]
    fn keep_runes_consults_subtables_in_order() {
        let font = sample();

        // 'A' resolves in (3,1); 'b' only in (1,0), to glyph 3.
        let subset = font.subset_keep_runes(&['A', 'b']).unwrap();

        let descs = &subset.glyf_table().unwrap().descs;
        assert!(!descs[1].raw.is_empty());
        assert!(descs[2].raw.is_empty());
        assert!(!descs[3].raw.is_empty());
    }

    #[test]
    fn keep_runes_reports_missing_rune() {
        let result = sample().subset_keep_runes(&['A', 'Z']);

        assert!(matches!(
            result,
            Err(TtError::Table(TtErrorKind::RuneNotFound, TtErrorSource::Subsetter))
        ));
    }

    #[test]
    fn simple_subset_truncates_per_glyph_tables() {
        let font = sample();
        let subset = font.subset_simple(2).unwrap();

        assert_eq!(subset.num_glyphs(), 2);
        assert_eq!(subset.glyf_table().unwrap().descs.len(), 2);
        assert_eq!(subset.loca_table().unwrap().len(), 3);
        assert_eq!(subset.hmtx_table().unwrap().num_entries(), 2);
        assert!(subset.hhea_table().unwrap().number_of_h_metrics <= 2);
    }

    #[test]
    fn simple_subset_rebuilds_cmap_subtables() {
        let subset = sample().subset_simple(2).unwrap();
        let cmap = subset.cmap_table().unwrap();

        // (3,1) format 4: runes 'A'..'C' clamp to the two-glyph prefix.
        let SubtableFormat::Format4(format4) = &cmap.subtables[0].format else {
            panic!("format changed");
        };

        assert_eq!(format4.start_code, vec![0x41]);
        assert_eq!(format4.end_code, vec![0x42]);
        assert_eq!(format4.id_delta, vec![-0x41]);

        // (1,0) format 0: 'a' -> 1 survives, 'b' -> 3 is out of range.
        let SubtableFormat::Format0(format0) = &cmap.subtables[1].format else {
            panic!("format changed");
        };

        assert_eq!(format0.glyph_id_array[0x61], 1);
        assert_eq!(format0.glyph_id_array[0x62], 0);
    }

    #[test]
    fn simple_subset_rejects_whole_font() {
        assert!(matches!(
            sample().subset_simple(4),
            Err(TtError::Table(TtErrorKind::Redundant, TtErrorSource::Subsetter))
        ));
        assert!(matches!(
            sample().subset_simple(10),
            Err(TtError::Table(TtErrorKind::Redundant, TtErrorSource::Subsetter))
        ));
    }

    #[test]
    fn simple_subset_to_notdef_only_writes_valid_font() {
        let subset = sample().subset_simple(1).unwrap();
        let bytes = subset.to_vec();

        assert!(validate_bytes(&bytes).is_ok());
        assert_eq!(Font::parse(&bytes).unwrap().num_glyphs(), 1);
    }

    #[test]
    fn subset_output_validates() {
        let subset = sample().subset_keep_indices(&[1, 3]).unwrap();
        let bytes = subset.to_vec();

        assert!(validate_bytes(&bytes).is_ok());

        let reparsed = Font::parse(&bytes).unwrap();
        assert_eq!(reparsed.num_glyphs(), 4);
        assert_eq!(reparsed.glyf_table().unwrap().descs[1], sample().glyf_table().unwrap().descs[1]);
    }
}
