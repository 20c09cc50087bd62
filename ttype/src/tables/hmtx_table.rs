use crate::error::*;
use crate::tables::{read_i16, read_u16, HheaTable, MaxpTable};
use crate::writer::ByteWriter;

/// Corresponds to the `hmtx` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx>
///
/// There is one logical entry per glyph: the first `numberOfHMetrics`
/// glyphs carry a full `{advanceWidth, lsb}` pair, the rest carry only a
/// left side bearing and inherit the last advance width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmtxTable {
    pub h_metrics: Vec<HorMetric>,
    pub left_side_bearings: Vec<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

impl HmtxTable {
    pub fn try_parse(
        bytes: &[u8],
        maxp_table: &MaxpTable,
        hhea_table: &HheaTable,
    ) -> Result<Self, TtError> {
        if maxp_table.num_glyphs < hhea_table.number_of_h_metrics {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::HmtxTable,
            ));
        }

        let h_metrics_len = hhea_table.number_of_h_metrics as usize;
        let bearings_len = maxp_table.num_glyphs as usize - h_metrics_len;

        if (h_metrics_len * 4) + (bearings_len * 2) > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::HmtxTable,
            ));
        }

        let mut h_metrics = Vec::with_capacity(h_metrics_len);

        for i in 0..h_metrics_len {
            h_metrics.push(HorMetric {
                advance_width: read_u16(bytes, i * 4),
                lsb: read_i16(bytes, (i * 4) + 2),
            });
        }

        let bearings_offset = h_metrics_len * 4;
        let mut left_side_bearings = Vec::with_capacity(bearings_len);

        for i in 0..bearings_len {
            left_side_bearings.push(read_i16(bytes, bearings_offset + (i * 2)));
        }

        Ok(Self {
            h_metrics,
            left_side_bearings,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        for metric in &self.h_metrics {
            w.write_u16(metric.advance_width);
            w.write_i16(metric.lsb);
        }

        for lsb in &self.left_side_bearings {
            w.write_i16(*lsb);
        }
    }

    /// Number of logical per-glyph entries.
    pub fn num_entries(&self) -> usize {
        self.h_metrics.len() + self.left_side_bearings.len()
    }

    /// Converts trailing metrics whose advance width repeats the previous
    /// one into bare left-side-bearing entries. Returns the new
    /// `numberOfHMetrics`, which the caller stores back into `hhea`.
    pub fn optimize(&mut self) -> u16 {
        let mut keep = self.h_metrics.len();

        while keep > 1 && self.h_metrics[keep - 1].advance_width == self.h_metrics[keep - 2].advance_width {
            keep -= 1;
        }

        let moved: Vec<i16> = self.h_metrics.drain(keep..).map(|m| m.lsb).collect();
        self.left_side_bearings.splice(0..0, moved);

        self.h_metrics.len() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(advance_width: u16, lsb: i16) -> HorMetric {
        HorMetric { advance_width, lsb }
    }

    #[test]
    fn optimize_folds_repeated_trailing_advances() {
        let mut hmtx = HmtxTable {
            h_metrics: vec![metric(600, 10), metric(500, 20), metric(500, 30), metric(500, 40)],
            left_side_bearings: vec![50],
        };

        assert_eq!(hmtx.optimize(), 2);
        assert_eq!(hmtx.h_metrics, vec![metric(600, 10), metric(500, 20)]);
        assert_eq!(hmtx.left_side_bearings, vec![30, 40, 50]);
        assert_eq!(hmtx.num_entries(), 5);
    }

    #[test]
    fn optimize_keeps_distinct_advances() {
        let mut hmtx = HmtxTable {
            h_metrics: vec![metric(600, 10), metric(500, 20)],
            left_side_bearings: Vec::new(),
        };

        assert_eq!(hmtx.optimize(), 2);
        assert_eq!(hmtx.left_side_bearings, Vec::<i16>::new());
    }

    #[test]
    fn optimize_keeps_at_least_one_metric() {
        let mut hmtx = HmtxTable {
            h_metrics: vec![metric(500, 10), metric(500, 20)],
            left_side_bearings: Vec::new(),
        };

        assert_eq!(hmtx.optimize(), 1);
        assert_eq!(hmtx.h_metrics, vec![metric(500, 10)]);
        assert_eq!(hmtx.left_side_bearings, vec![20]);
    }
}
