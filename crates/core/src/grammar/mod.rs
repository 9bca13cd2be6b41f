/// Buffered character cursor with one-step pushback.
pub mod cursor;
/// Diagnostic re-exports and the [`Reporter`](diag::Reporter) sink.
pub mod diag;
/// Control-word lexer, invoked after each `\`.
pub mod lexer;
/// Parser loop and control-word interpreter.
pub(crate) mod parser;
/// Keyword → action dispatch table generated at build time.
pub mod table;
