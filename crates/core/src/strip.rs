//! Public stripping entry points.

use std::io::Write;

use log::debug;
use serde::Serialize;

use crate::grammar::cursor::Cursor;
use crate::grammar::diag::{Diagnostic, LOG_TARGET, LogReporter, Reporter, Span, codes};
use crate::grammar::lexer::LexerLimits;
use crate::grammar::parser::Parser;
use crate::source::{CharSource, StrSource};
use crate::state::Status;

/// Signature every RTF document starts with.
pub const RTF_MAGIC: &str = "{\\rtf";

/// Options for a strip operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct StripConfig {
    /// Copy input that is not RTF verbatim to the output instead of dropping it.
    pub copy_if_not_rtf: bool,
    /// Length caps for control words.
    pub limits: LexerLimits,
}

impl StripConfig {
    /// Set [`copy_if_not_rtf`](Self::copy_if_not_rtf).
    pub fn copy_if_not_rtf(mut self, copy: bool) -> Self {
        self.copy_if_not_rtf = copy;
        self
    }

    /// Replace the lexer limits.
    pub fn with_limits(mut self, limits: LexerLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Result of [`strip_str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripResult {
    /// Extracted text.
    pub text: String,
    /// Final status.
    pub status: Status,
    /// Diagnostics raised while stripping, in input order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Strip `source`, writing visible text to `out` as UTF-8 and handing
/// diagnostics to `reporter`.
///
/// The source is consumed and dropped on return; `out` is not flushed.
pub fn strip_with_reporter<S, W, R>(
    source: S,
    out: &mut W,
    config: &StripConfig,
    reporter: &mut R,
) -> Status
where
    S: CharSource,
    W: Write + ?Sized,
    R: Reporter + ?Sized,
{
    let mut cursor = Cursor::new(source);
    let magic_len = RTF_MAGIC.chars().count();
    let has_magic = match cursor.fill_to(magic_len) {
        Ok(head) => head.iter().take(magic_len).copied().eq(RTF_MAGIC.chars()),
        Err(e) => {
            reporter.report(Diagnostic::for_code(
                codes::INPUT_READ_FAILED,
                e.to_string(),
                Some(Span::empty(0)),
            ));
            false
        }
    };

    if has_magic {
        return Parser::new(cursor, config.limits, out, reporter).run();
    }

    debug!(target: LOG_TARGET, "input lacks the {RTF_MAGIC} signature");
    reporter.report(Diagnostic::for_code(
        codes::NOT_RTF,
        format!("input does not start with `{RTF_MAGIC}`"),
        Some(Span::empty(0)),
    ));
    if config.copy_if_not_rtf {
        copy_verbatim(&mut cursor, out, reporter);
    }
    Status::NotRtf
}

fn copy_verbatim<S, W, R>(cursor: &mut Cursor<S>, out: &mut W, reporter: &mut R)
where
    S: CharSource,
    W: Write + ?Sized,
    R: Reporter + ?Sized,
{
    let mut buf = [0u8; 4];
    loop {
        let at = cursor.offset();
        let c = match cursor.read() {
            Ok(Some(c)) => c,
            Ok(None) => return,
            Err(e) => {
                reporter.report(Diagnostic::for_code(
                    codes::INPUT_READ_FAILED,
                    e.to_string(),
                    Some(Span::empty(at)),
                ));
                return;
            }
        };
        if let Err(e) = out.write_all(c.encode_utf8(&mut buf).as_bytes()) {
            reporter.report(Diagnostic::for_code(
                codes::OUTPUT_WRITE_FAILED,
                format!("writing copied text failed: {e}"),
                Some(Span::empty(at)),
            ));
            return;
        }
    }
}

/// Strip `source` into `out`, sending diagnostics to the `log` facade.
pub fn strip<S, W>(source: S, out: &mut W, config: &StripConfig) -> Status
where
    S: CharSource,
    W: Write + ?Sized,
{
    strip_with_reporter(source, out, config, &mut LogReporter)
}

/// Strip an in-memory document.
pub fn strip_str(input: &str, config: &StripConfig) -> StripResult {
    let mut out = Vec::with_capacity(input.len());
    let mut diagnostics = Vec::new();
    let status = strip_with_reporter(StrSource::new(input), &mut out, config, &mut diagnostics);
    let text = String::from_utf8(out)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    StripResult {
        text,
        status,
        diagnostics,
    }
}

/// Whether `text` starts with the RTF signature `{\rtf`.
pub fn is_rtf(text: &str) -> bool {
    text.starts_with(RTF_MAGIC)
}

/// Remove exactly one trailing `\n`, if present.
pub fn trim_final_newline(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}
