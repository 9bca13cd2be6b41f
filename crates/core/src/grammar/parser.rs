use std::io::Write;

use log::{debug, trace};

use super::{
    cursor::{Cursor, CursorError},
    diag::{Diagnostic, LOG_TARGET, Reporter, Span, codes},
    lexer::{ControlWord, LexFault, Lexeme, Lexer, LexerLimits},
    table::{self, Action, UnicodeError},
};
use crate::source::CharSource;
use crate::state::{ParserState, Status};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Drives the cursor and lexer over one RTF document.
pub(crate) struct Parser<'a, S, W: ?Sized, R: ?Sized> {
    cursor: Cursor<S>,
    lexer: Lexer,
    interp: Interpreter<'a, W, R>,
}

/// Applies lexemes to the parser state and writes visible text.
struct Interpreter<'a, W: ?Sized, R: ?Sized> {
    state: ParserState,
    out: &'a mut W,
    reporter: &'a mut R,
    /// Set once the output failed; nothing more is parsed.
    halted: bool,
    /// High surrogate from a `\u` escape, waiting for its low half.
    pending_high: Option<(u16, Span)>,
}

impl<'a, S, W, R> Parser<'a, S, W, R>
where
    S: CharSource,
    W: Write + ?Sized,
    R: Reporter + ?Sized,
{
    pub(crate) fn new(
        cursor: Cursor<S>,
        limits: LexerLimits,
        out: &'a mut W,
        reporter: &'a mut R,
    ) -> Self {
        Self {
            cursor,
            lexer: Lexer::new(limits),
            interp: Interpreter {
                state: ParserState::default(),
                out,
                reporter,
                halted: false,
                pending_high: None,
            },
        }
    }

    /// Parse to end of input and return the final status.
    pub(crate) fn run(mut self) -> Status {
        while !self.interp.halted {
            let start = self.cursor.offset();
            let c = match self.cursor.read() {
                Ok(Some(c)) => c,
                Ok(None) => break,
                Err(e) => {
                    self.interp.cursor_fault(e, start);
                    continue;
                }
            };
            match c {
                '{' => {
                    self.interp.state.destinations.push();
                    trace!(target: LOG_TARGET, "enter group, depth {}", self.interp.state.destinations.depth());
                }
                '}' => {
                    if self.interp.state.destinations.pop().is_err() {
                        self.interp.diagnose(Diagnostic::for_code(
                            codes::UNMATCHED_GROUP_CLOSE,
                            "`}` closes a group that was never opened",
                            Some(Span::new(start, start + 1)),
                        ));
                    } else {
                        trace!(target: LOG_TARGET, "leave group, depth {}", self.interp.state.destinations.depth());
                    }
                }
                '\\' => {
                    let (lexeme, faults) = self.lexer.lex(&mut self.cursor);
                    let span = Span::new(start, self.cursor.offset().max(start + 1));
                    for fault in faults {
                        self.interp.lex_fault(fault, span);
                    }
                    if let Some(lexeme) = lexeme {
                        self.interp.apply(lexeme, span);
                    }
                }
                '\r' | '\n' => {}
                _ => self.interp.emit(c, start),
            }
        }

        if !self.interp.halted {
            self.interp.flush_surrogate();
        }
        let depth = self.interp.state.destinations.depth();
        if depth > 0 && !self.interp.halted {
            let end = self.cursor.offset();
            self.interp.diagnose(
                Diagnostic::for_code(
                    codes::UNBALANCED_GROUPS,
                    format!("input ended with {depth} unclosed group(s)"),
                    Some(Span::empty(end)),
                )
                .with_context(ctx!("depth" => depth.to_string())),
            );
        }
        self.interp.state.status
    }
}

impl<W, R> Interpreter<'_, W, R>
where
    W: Write + ?Sized,
    R: Reporter + ?Sized,
{
    fn diagnose(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity.is_corruption() {
            self.state.status.degrade();
        }
        self.reporter.report(diagnostic);
    }

    fn emit(&mut self, c: char, at: usize) {
        if self.halted || !self.state.destinations.is_visible() {
            return;
        }
        self.flush_surrogate();
        self.write(c, at);
    }

    fn write(&mut self, c: char, at: usize) {
        let mut buf = [0u8; 4];
        if let Err(e) = self.out.write_all(c.encode_utf8(&mut buf).as_bytes()) {
            self.halted = true;
            self.diagnose(Diagnostic::for_code(
                codes::OUTPUT_WRITE_FAILED,
                format!("writing extracted text failed: {e}"),
                Some(Span::empty(at)),
            ));
        }
    }

    fn apply(&mut self, lexeme: Lexeme<'_>, span: Span) {
        match lexeme {
            Lexeme::HexByte(byte) => {
                let c = self.state.charset.translate(byte);
                self.emit(c, span.start);
            }
            Lexeme::Control(word) => self.dispatch(word, span),
        }
    }

    fn dispatch(&mut self, word: ControlWord<'_>, span: Span) {
        let Some(action) = table::lookup(word.keyword) else {
            trace!(target: LOG_TARGET, "ignoring control word \\{}", word.keyword.escape_debug());
            return;
        };
        match action {
            Action::InsertionChar(c) => self.emit(c, span.start),
            Action::UnicodeEscape => match table::unicode_unit(word.parameter) {
                Ok(unit) => self.unicode_unit(unit, span),
                Err(e) => self.diagnose(
                    Diagnostic::for_code(codes::UNICODE_OUT_OF_RANGE, e.to_string(), Some(span))
                        .with_context(ctx!("parameter" => word.parameter.unwrap_or_default())),
                ),
            },
            Action::TextDestination => self.state.destinations.set_visible(true),
            Action::NoTextDestination => self.state.destinations.set_visible(false),
            Action::CharsetDirective(named) => match self.state.charset.set_named(named) {
                Ok(charset) => {
                    debug!(target: LOG_TARGET, "\\{} selects charset {}", named.keyword(), charset.name());
                }
                Err(e) => self.diagnose(
                    Diagnostic::for_code(codes::UNSUPPORTED_CHARSET, e.to_string(), Some(span))
                        .with_context(ctx!("charset" => named.label())),
                ),
            },
            Action::CharsetFromCodepage => {
                let Some(codepage) = table::codepage_number(word.parameter) else {
                    return;
                };
                match self.state.charset.set_from_codepage(codepage) {
                    Ok(charset) => {
                        debug!(target: LOG_TARGET, "codepage {codepage} selects charset {}", charset.name());
                    }
                    Err(e) => self.diagnose(
                        Diagnostic::for_code(codes::UNSUPPORTED_CHARSET, e.to_string(), Some(span))
                            .with_context(ctx!("charset" => codepage.to_string())),
                    ),
                }
            }
        }
    }

    /// Emit one UTF-16 code unit, joining surrogate pairs.
    fn unicode_unit(&mut self, unit: u16, span: Span) {
        if let Some(c) = char::from_u32(u32::from(unit)) {
            return self.emit(c, span.start);
        }
        if self.halted || !self.state.destinations.is_visible() {
            return;
        }
        if (0xD800..0xDC00).contains(&unit) {
            self.flush_surrogate();
            self.pending_high = Some((unit, span));
        } else if let Some((high, first)) = self.pending_high.take() {
            for c in char::decode_utf16([high, unit]).flatten() {
                self.write(c, first.start);
            }
        } else {
            self.unpaired_surrogate(unit, span);
        }
    }

    /// Report a high surrogate that never met its low half.
    fn flush_surrogate(&mut self) {
        if let Some((high, span)) = self.pending_high.take() {
            self.unpaired_surrogate(high, span);
        }
    }

    fn unpaired_surrogate(&mut self, unit: u16, span: Span) {
        self.diagnose(
            Diagnostic::for_code(
                codes::UNICODE_OUT_OF_RANGE,
                UnicodeError::UnpairedSurrogate(unit).to_string(),
                Some(span),
            )
            .with_context(ctx!("parameter" => unit.to_string())),
        );
    }

    fn lex_fault(&mut self, fault: LexFault, span: Span) {
        let message = fault.to_string();
        let diagnostic = match fault {
            LexFault::KeywordTooLong { keyword, limit } => {
                Diagnostic::for_code(codes::KEYWORD_TOO_LONG, message, Some(span))
                    .with_context(ctx!("keyword" => keyword, "limit" => limit.to_string()))
            }
            LexFault::ParameterTooLong { keyword, limit } => {
                Diagnostic::for_code(codes::PARAMETER_TOO_LONG, message, Some(span))
                    .with_context(ctx!("keyword" => keyword, "limit" => limit.to_string()))
            }
            LexFault::InvalidHexEscape { digits } => {
                Diagnostic::for_code(codes::INVALID_HEX_ESCAPE, message, Some(span))
                    .with_context(ctx!("digits" => digits))
            }
            LexFault::Cursor(e) => return self.cursor_fault(e, span.end),
        };
        self.diagnose(diagnostic);
    }

    fn cursor_fault(&mut self, error: CursorError, at: usize) {
        let code = match error {
            CursorError::Io(_) => codes::INPUT_READ_FAILED,
            CursorError::NothingToUnread { .. } => codes::CURSOR_UNREAD,
        };
        self.diagnose(Diagnostic::for_code(code, error.to_string(), Some(Span::empty(at))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StrSource;

    fn run(input: &str) -> (String, Status, Vec<Diagnostic>) {
        let mut out = Vec::new();
        let mut diags = Vec::new();
        let status = Parser::new(
            Cursor::new(StrSource::new(input)),
            LexerLimits::default(),
            &mut out,
            &mut diags,
        )
        .run();
        (String::from_utf8(out).unwrap(), status, diags)
    }

    fn ids(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.id.as_ref()).collect()
    }

    #[test]
    fn plain_text_and_groups() {
        let (text, status, diags) = run("{a{b}c}");
        assert_eq!(text, "abc");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn raw_line_breaks_are_dropped() {
        let (text, _, _) = run("{a\r\nb\nc}");
        assert_eq!(text, "abc");
    }

    #[test]
    fn escaped_line_break_is_a_paragraph() {
        let (text, _, _) = run("{a\\\nb}");
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn hidden_destination_restored_on_group_close() {
        let (text, status, _) = run("{\\rtf1{\\fonttbl{\\f0 Arial;}}Body}");
        assert_eq!(text, "Body");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn stray_close_is_reported_with_span() {
        let (text, status, diags) = run("{a}}b");
        assert_eq!(text, "ab");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNMATCHED_GROUP_CLOSE]);
        assert_eq!(diags[0].span, Some(Span::new(3, 4)));
    }

    #[test]
    fn unclosed_groups_reported_at_end() {
        let (text, status, diags) = run("{{a");
        assert_eq!(text, "a");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNBALANCED_GROUPS]);
        let ctx = diags[0].context.as_ref().unwrap();
        assert_eq!(ctx["depth"], "2");
    }

    #[test]
    fn unknown_control_words_are_silent() {
        let (text, status, diags) = run("{\\foo\\bar12 x\\~y}");
        assert_eq!(text, "xy");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn unicode_escape_out_of_range() {
        let (text, status, diags) = run("{\\u70000 x}");
        assert_eq!(text, "x");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNICODE_OUT_OF_RANGE]);
        assert_eq!(diags[0].span, Some(Span::new(1, 9)));
    }

    #[test]
    fn unicode_escape_without_parameter() {
        let (_, status, diags) = run("{\\u x}");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNICODE_OUT_OF_RANGE]);
    }

    #[test]
    fn surrogate_pair_joins_into_one_char() {
        let (text, status, diags) = run("{a\\u55357?\\u56832?b}");
        assert_eq!(text, "a\u{1F600}b");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn surrogate_pair_survives_ignored_control_words() {
        let (text, status, _) = run("{\\u55357\\uc1 \\u56832 x}");
        assert_eq!(text, "\u{1F600}x");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn lone_high_surrogate_is_reported_when_text_follows() {
        let (text, status, diags) = run("{\\u55357?x}");
        assert_eq!(text, "x");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNICODE_OUT_OF_RANGE]);
        assert_eq!(diags[0].span, Some(Span::new(1, 9)));
        assert_eq!(diags[0].context.as_ref().unwrap()["parameter"], "55357");
    }

    #[test]
    fn lone_surrogates_at_end_and_without_partner() {
        let (text, status, diags) = run("{\\u56832?y\\u55357?}");
        assert_eq!(text, "y");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(
            ids(&diags),
            [codes::UNICODE_OUT_OF_RANGE, codes::UNICODE_OUT_OF_RANGE]
        );
    }

    #[test]
    fn hidden_surrogates_are_ignored() {
        let (text, status, diags) = run("{{\\fonttbl \\u55357?}z}");
        assert_eq!(text, "z");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn codepage_without_parameter_is_silent() {
        let (text, status, diags) = run("{\\ansicpg \\'e9}");
        assert_eq!(text, "\u{e9}");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn unsupported_codepage_keeps_previous_charset() {
        let (text, status, diags) = run("{\\ansicpg1251\\ansicpg4242\\'c0}");
        assert_eq!(text, "\u{410}");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::UNSUPPORTED_CHARSET]);
        assert_eq!(diags[0].context.as_ref().unwrap()["charset"], "4242");
    }

    #[test]
    fn pc_charsets_decode_hex_escapes() {
        let (text, status, diags) = run("{\\pc caf\\'82 \\'b3}");
        assert_eq!(text, "caf\u{e9} \u{2502}");
        assert_eq!(status, Status::Ok);
        assert!(diags.is_empty());

        let (text, status, _) = run("{\\pca \\'82\\ansicpg850 \\'d5\\ansicpg437 \\'d5}");
        assert_eq!(text, "\u{e9}\u{131}\u{2552}");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn invalid_hex_escape_is_reported() {
        let (text, status, diags) = run("{a\\'zzb}");
        assert_eq!(text, "ab");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::INVALID_HEX_ESCAPE]);
    }

    #[test]
    fn overlong_keyword_is_reported() {
        let input = format!("{{\\{} x}}", "k".repeat(40));
        let (text, status, diags) = run(&input);
        assert_eq!(text, "x");
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::KEYWORD_TOO_LONG]);
    }

    #[test]
    fn write_failure_halts_after_one_diagnostic() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("pipe closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut diags = Vec::new();
        let status = Parser::new(
            Cursor::new(StrSource::new("{lots of text}}}")),
            LexerLimits::default(),
            &mut Broken,
            &mut diags,
        )
        .run();
        assert_eq!(status, Status::Corrupted);
        assert_eq!(ids(&diags), [codes::OUTPUT_WRITE_FAILED]);
    }
}
