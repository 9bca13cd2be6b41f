//! rtf-strip core library.
//!
//! Extracts the visible plain text of an RTF document in a single streaming
//! pass. The main entry points are [`strip_str`] for in-memory input and
//! [`strip_with_reporter`] for streaming a [`CharSource`] into any
//! [`std::io::Write`] sink.

#![warn(missing_docs)]

/// Active-charset tracking for hex escapes.
pub mod charset;
/// RTF grammar: cursor, lexer, dispatch table, parser.
pub mod grammar;
/// Convenience wrapper with a process-wide last status.
pub mod legacy;
/// Character sources feeding the engine.
pub mod source;
/// Per-document parser state.
pub mod state;
/// Public stripping entry points.
pub mod strip;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Strip API
pub use strip::{
    RTF_MAGIC, StripConfig, StripResult, is_rtf, strip, strip_str, strip_with_reporter,
    trim_final_newline,
};

// Sources
pub use source::{CharSource, DecodeReader, StrSource};

// State
pub use state::Status;

// Lexer limits
pub use grammar::lexer::LexerLimits;

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{
    Diagnostic, LogReporter, NullReporter, Reporter, Severity, Span, codes, explain,
};
