//! Cross-checks a parsed font against the byte stream it came from.

use std::path::Path;

use log::warn;

use crate::error::*;
use crate::tables::font::CHECKSUM_MAGIC;
use crate::tables::{table_tag, Font};
use crate::writer::checksum;

/// Parses the font in `bytes` and verifies every table checksum plus the
/// `head` checksum adjustment identity.
pub fn validate_bytes(bytes: &[u8]) -> Result<(), TtError> {
    let font = Font::parse(bytes)?;
    font.validate(bytes)
}

/// Parses and validates the font in the file at `path`.
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<(), TtError> {
    let bytes = std::fs::read(path)?;
    validate_bytes(&bytes)
}

fn tag_str(table_tag: u32) -> String {
    String::from_utf8_lossy(&table_tag.to_be_bytes()).into_owned()
}

impl Font {
    /// Recomputes each directory record's checksum from `bytes`, treating
    /// the `head` adjustment field as zero, then checks the whole-file
    /// adjustment identity. Every mismatch is logged; checking continues
    /// past failures and the first error is returned at the end.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), TtError> {
        let mut first_error = None;

        for record in &self.records {
            let start = record.offset as usize;
            let end = start + record.length as usize;

            if end > bytes.len() {
                warn!(
                    "table {} extends past the end of the file ({} > {})",
                    tag_str(record.table_tag),
                    end,
                    bytes.len(),
                );
                first_error.get_or_insert(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::TableRecord,
                ));
                continue;
            }

            let sum = if record.table_tag == table_tag::HEAD {
                let mut window = bytes[start..end].to_vec();

                if window.len() >= 12 {
                    window[8..12].fill(0);
                }

                checksum(&window)
            } else {
                checksum(&bytes[start..end])
            };

            if sum != record.checksum {
                warn!(
                    "checksum mismatch for table {}: computed {:#010x}, recorded {:#010x}",
                    tag_str(record.table_tag),
                    sum,
                    record.checksum,
                );
                first_error.get_or_insert(TtError::Table(
                    TtErrorKind::ChecksumMismatch,
                    TtErrorSource::TableRecord,
                ));
            }
        }

        if let Some(head) = &self.head {
            let head_record = self
                .records
                .iter()
                .find(|record| record.table_tag == table_tag::HEAD);

            if let Some(record) = head_record {
                let adjustment_offset = record.offset as usize + 8;

                if adjustment_offset + 4 <= bytes.len() {
                    let mut copy = bytes.to_vec();
                    copy[adjustment_offset..(adjustment_offset + 4)].fill(0);

                    let expected = CHECKSUM_MAGIC.wrapping_sub(checksum(&copy));

                    if expected != head.checksum_adjustment {
                        warn!(
                            "head checksum adjustment mismatch: computed {:#010x}, recorded {:#010x}",
                            expected, head.checksum_adjustment,
                        );
                        first_error.get_or_insert(TtError::Table(
                            TtErrorKind::ChecksumMismatch,
                            TtErrorSource::HeadTable,
                        ));
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::font::test_font::sample;

    #[test]
    fn written_fonts_validate() {
        let bytes = sample().to_vec();
        assert!(validate_bytes(&bytes).is_ok());
    }

    #[test]
    fn adjustment_satisfies_checksum_identity() {
        let bytes = sample().to_vec();
        let font = Font::parse(&bytes).unwrap();

        let record = font
            .records
            .iter()
            .find(|record| record.table_tag == table_tag::HEAD)
            .unwrap();

        let mut copy = bytes.clone();
        let offset = record.offset as usize + 8;
        copy[offset..(offset + 4)].fill(0);

        assert_eq!(
            CHECKSUM_MAGIC.wrapping_sub(checksum(&copy)),
            font.head_table().unwrap().checksum_adjustment,
        );
    }

    #[test]
    fn corrupted_table_is_reported() {
        let mut bytes = sample().to_vec();

        // Damage the last content byte (inside the post table).
        let len = bytes.len();
        bytes[len - 1] ^= 0xFF;

        assert!(matches!(
            validate_bytes(&bytes),
            Err(TtError::Table(TtErrorKind::ChecksumMismatch, TtErrorSource::TableRecord))
        ));
    }

    #[test]
    fn tampered_adjustment_is_reported() {
        let mut bytes = sample().to_vec();
        let font = Font::parse(&bytes).unwrap();

        let record = font
            .records
            .iter()
            .find(|record| record.table_tag == table_tag::HEAD)
            .unwrap();

        let offset = record.offset as usize + 8;
        bytes[offset] ^= 0x01;

        assert!(matches!(
            validate_bytes(&bytes),
            Err(TtError::Table(TtErrorKind::ChecksumMismatch, TtErrorSource::HeadTable))
        ));
    }
}
