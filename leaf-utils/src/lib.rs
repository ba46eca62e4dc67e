/// Display helpers for infractions and tags.
pub mod formatting;
/// Fuzzy name matching for tag search.
pub mod fuzzy;
/// Pure parser and validation helpers.
pub mod parse;
/// Shared time helpers.
pub mod time;

/// Longest tag name the `tags.name` column accepts.
pub const MAX_TAG_NAME_CHARS: usize = 128;
