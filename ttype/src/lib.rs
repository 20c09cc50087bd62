//! Parsing, validation, subsetting and re-serialization of TrueType fonts.
//!
//! The intended consumer is a document producer (typically a PDF writer)
//! that embeds only the glyphs a document actually uses: parse a font,
//! prune the data of unused glyphs while keeping the glyph-index space
//! intact, and write out a conformant TrueType file.

pub mod error;
pub mod tables;

mod subset;
mod validate;
mod writer;

pub use error::{TtError, TtErrorKind, TtErrorSource};
pub use tables::font::Font;
pub use validate::{validate_bytes, validate_file};

/// A glyph's numeric identifier within a font. Index `0` is reserved
/// for the `.notdef` glyph.
pub type GlyphIndex = u16;
