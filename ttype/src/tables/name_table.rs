use crate::error::*;
use crate::tables::read_u16;
use crate::writer::ByteWriter;

/// Corresponds to the `name` table.
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/name>
///
/// Record strings are kept as raw bytes so the table survives a
/// parse/write cycle unchanged regardless of encoding; the string storage
/// is re-packed in record order on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTable {
    pub version: u16,
    pub name_records: Vec<NameRecord>,
    pub lang_tags: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub data: Vec<u8>,
}

impl NameRecord {
    /// Decodes the record string for the UTF-16BE platforms (Unicode and
    /// Windows). Returns `None` for other platforms or malformed data.
    pub fn to_string_lossy(&self) -> Option<String> {
        if self.platform_id != 0 && self.platform_id != 3 {
            return None;
        }

        if self.data.len() % 2 != 0 {
            return None;
        }

        let utf16 = self
            .data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes(pair.try_into().unwrap()))
            .collect::<Vec<u16>>();

        Some(String::from_utf16_lossy(&utf16))
    }
}

impl NameTable {
    pub fn try_parse(bytes: &[u8]) -> Result<Self, TtError> {
        if bytes.len() < 6 {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::NameTable,
            ));
        }

        let version = read_u16(bytes, 0);

        if version != 0 && version != 1 {
            return Err(TtError::Table(
                TtErrorKind::InvalidFormat,
                TtErrorSource::NameTable,
            ));
        }

        let name_count = read_u16(bytes, 2) as usize;
        let storage_offset = read_u16(bytes, 4) as usize;
        let mut record_offset = 6;

        if record_offset + (name_count * 12) > bytes.len() {
            return Err(TtError::Table(
                TtErrorKind::UnexpectedEof,
                TtErrorSource::NameTable,
            ));
        }

        let mut name_records = Vec::with_capacity(name_count);

        for _ in 0..name_count {
            let length = read_u16(bytes, record_offset + 8) as usize;
            let string_offset = storage_offset + read_u16(bytes, record_offset + 10) as usize;

            if string_offset + length > bytes.len() {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::NameRecord,
                ));
            }

            name_records.push(NameRecord {
                platform_id: read_u16(bytes, record_offset),
                encoding_id: read_u16(bytes, record_offset + 2),
                language_id: read_u16(bytes, record_offset + 4),
                name_id: read_u16(bytes, record_offset + 6),
                data: bytes[string_offset..(string_offset + length)].to_vec(),
            });

            record_offset += 12;
        }

        let mut lang_tags = Vec::new();

        if version == 1 {
            if record_offset + 2 > bytes.len() {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::NameTable,
                ));
            }

            let lang_tag_count = read_u16(bytes, record_offset) as usize;
            record_offset += 2;

            if record_offset + (lang_tag_count * 4) > bytes.len() {
                return Err(TtError::Table(
                    TtErrorKind::UnexpectedEof,
                    TtErrorSource::NameTable,
                ));
            }

            for _ in 0..lang_tag_count {
                let length = read_u16(bytes, record_offset) as usize;
                let tag_offset = storage_offset + read_u16(bytes, record_offset + 2) as usize;

                if tag_offset + length > bytes.len() {
                    return Err(TtError::Table(
                        TtErrorKind::UnexpectedEof,
                        TtErrorSource::NameRecord,
                    ));
                }

                lang_tags.push(bytes[tag_offset..(tag_offset + length)].to_vec());
                record_offset += 4;
            }
        }

        Ok(Self {
            version,
            name_records,
            lang_tags,
        })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        let mut storage_offset = 6 + (12 * self.name_records.len());

        if self.version == 1 {
            storage_offset += 2 + (4 * self.lang_tags.len());
        }

        w.write_u16(self.version);
        w.write_u16(self.name_records.len() as u16);
        w.write_u16(storage_offset as u16);

        let mut string_offset = 0usize;

        for record in &self.name_records {
            w.write_u16(record.platform_id);
            w.write_u16(record.encoding_id);
            w.write_u16(record.language_id);
            w.write_u16(record.name_id);
            w.write_u16(record.data.len() as u16);
            w.write_u16(string_offset as u16);
            string_offset += record.data.len();
        }

        if self.version == 1 {
            w.write_u16(self.lang_tags.len() as u16);

            for lang_tag in &self.lang_tags {
                w.write_u16(lang_tag.len() as u16);
                w.write_u16(string_offset as u16);
                string_offset += lang_tag.len();
            }
        }

        for record in &self.name_records {
            w.write_bytes(&record.data);
        }

        for lang_tag in &self.lang_tags {
            w.write_bytes(lang_tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_parse_preserves_records() {
        let table = NameTable {
            version: 0,
            name_records: vec![
                NameRecord {
                    platform_id: 3,
                    encoding_id: 1,
                    language_id: 0x0409,
                    name_id: 1,
                    data: "Deja Vu".encode_utf16().flat_map(|c| c.to_be_bytes()).collect(),
                },
                NameRecord {
                    platform_id: 1,
                    encoding_id: 0,
                    language_id: 0,
                    name_id: 1,
                    data: b"Deja Vu".to_vec(),
                },
            ],
            lang_tags: Vec::new(),
        };

        let mut w = ByteWriter::new();
        table.write(&mut w);

        let reparsed = NameTable::try_parse(&w.into_bytes()).unwrap();
        assert_eq!(reparsed, table);
        assert_eq!(
            reparsed.name_records[0].to_string_lossy().as_deref(),
            Some("Deja Vu")
        );
        assert_eq!(reparsed.name_records[1].to_string_lossy(), None);
    }
}
