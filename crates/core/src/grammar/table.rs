//! Control-word dispatch table.
//!
//! The keyword → [`Action`] mapping is compiled from
//! `spec/control_words.json` by the build script into a plain `match`.

use crate::charset::NamedCharset;

/// What the interpreter does when it meets a known control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit a fixed character.
    InsertionChar(char),
    /// The parameter is a code point to emit.
    UnicodeEscape,
    /// Content that follows in this group is visible.
    TextDestination,
    /// Content that follows in this group is suppressed.
    NoTextDestination,
    /// Select a named charset.
    CharsetDirective(NamedCharset),
    /// The parameter is a Windows codepage number.
    CharsetFromCodepage,
}

/// Look up a control word. Keywords are case-sensitive; unknown keywords
/// return `None`.
pub fn lookup(keyword: &str) -> Option<Action> {
    include!(concat!(env!("OUT_DIR"), "/generated_lookup.rs"))
}

/// Every keyword known to [`lookup`], sorted.
pub const KEYWORDS: &[&str] = include!(concat!(env!("OUT_DIR"), "/generated_keywords.rs"));

/// Whether `keyword` is the Unicode-escape control word.
pub fn is_unicode_keyword(keyword: &str) -> bool {
    matches!(lookup(keyword), Some(Action::UnicodeEscape))
}

/// Why a Unicode-escape parameter produced no character.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnicodeError {
    /// The control word carried no parameter.
    #[error("unicode escape has no code point")]
    Missing,
    /// The value does not fit in a UTF-16 code unit.
    #[error("code point {0} is outside the basic multilingual plane")]
    OutOfRange(String),
    /// A surrogate that is not part of a high/low pair.
    #[error("UTF-16 surrogate U+{0:04X} has no partner")]
    UnpairedSurrogate(u16),
}

/// Decode the parameter of a Unicode escape into a UTF-16 code unit.
///
/// Surrogates are returned as-is; pairing them is up to the caller.
pub fn unicode_unit(parameter: Option<&str>) -> Result<u16, UnicodeError> {
    let digits = parameter.ok_or(UnicodeError::Missing)?;
    digits
        .parse::<u16>()
        .map_err(|_| UnicodeError::OutOfRange(digits.to_string()))
}

/// Parse a codepage parameter. Missing or unparseable values yield `None`.
pub fn codepage_number(parameter: Option<&str>) -> Option<u32> {
    parameter?.parse().ok()
}
