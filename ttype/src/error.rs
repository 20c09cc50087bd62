use thiserror::Error;

/// Error returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum TtError {
    /// A structural error, tagged with what went wrong and where.
    #[error("{0} in {1}")]
    Table(TtErrorKind, TtErrorSource),
    /// An I/O failure from one of the file-path conveniences.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TtErrorKind {
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("invalid format")]
    InvalidFormat,
    #[error("unsupported table or subformat")]
    UnsupportedTable,
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("rune not found")]
    RuneNotFound,
    #[error("redundant subset")]
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TtErrorSource {
    #[error("offset table")]
    OffsetTable,
    #[error("table record")]
    TableRecord,
    #[error("head table")]
    HeadTable,
    #[error("maxp table")]
    MaxpTable,
    #[error("hhea table")]
    HheaTable,
    #[error("hmtx table")]
    HmtxTable,
    #[error("loca table")]
    LocaTable,
    #[error("glyf table")]
    GlyfTable,
    #[error("cmap table")]
    CmapTable,
    #[error("cmap subtable")]
    CmapSubtable,
    #[error("name table")]
    NameTable,
    #[error("name record")]
    NameRecord,
    #[error("post table")]
    PostTable,
    #[error("OS/2 table")]
    Os2Table,
    #[error("cvt table")]
    CvtTable,
    #[error("prep table")]
    PrepTable,
    #[error("font file")]
    FontFile,
    #[error("subsetter")]
    Subsetter,
}
