//! Source locations.
//!
//! The core never reads source text; it only carries the location objects a
//! collaborator's parser hands it, per the anchor token convention in the
//! node-key scheme (definition name / call message location).

/// A source location, as supplied by the host parser: a line plus a
/// column range on that line, plus the byte offset of the anchor token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Loc {
    pub start_line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub byte_offset: u32,
}

impl Loc {
    #[must_use]
    pub fn new(start_line: u32, start_column: u32, end_column: u32, byte_offset: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_column,
            byte_offset,
        }
    }

    /// A placeholder location for synthesized nodes (e.g. an implicit nil
    /// literal standing in for a missing `else` branch). Carries a byte
    /// offset of `u32::MAX` so it never collides with a real anchor token.
    #[must_use]
    pub fn synthetic() -> Self {
        Self {
            start_line: 0,
            start_column: 0,
            end_column: 0,
            byte_offset: u32::MAX,
        }
    }
}
