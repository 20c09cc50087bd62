use crate::tables::read_i16;
use crate::writer::ByteWriter;

/// Corresponds to the `cvt ` table: an array of FWORD control values used
/// by the hinting programs. Preserved end-to-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvtTable {
    pub values: Vec<i16>,
}

impl CvtTable {
    pub fn parse(bytes: &[u8]) -> Self {
        let values = (0..bytes.len() / 2).map(|i| read_i16(bytes, i * 2)).collect();

        Self { values }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        for value in &self.values {
            w.write_i16(*value);
        }
    }
}
