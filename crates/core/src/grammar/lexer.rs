use super::cursor::{Cursor, CursorError};
use super::table;
use crate::source::CharSource;

/// Default cap on control-word keyword length.
pub const DEFAULT_MAX_KEYWORD_LEN: usize = 30;
/// Default cap on numeric parameter length.
pub const DEFAULT_MAX_PARAMETER_LEN: usize = 20;

/// Length caps applied while lexing control words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerLimits {
    /// Longest accepted keyword, in letters.
    pub max_keyword_len: usize,
    /// Longest accepted numeric parameter, in digits.
    pub max_parameter_len: usize,
}

impl Default for LexerLimits {
    fn default() -> Self {
        Self {
            max_keyword_len: DEFAULT_MAX_KEYWORD_LEN,
            max_parameter_len: DEFAULT_MAX_PARAMETER_LEN,
        }
    }
}

/// A control word or control symbol, borrowing the lexer's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord<'a> {
    /// ASCII letters, or the single character of a control symbol.
    pub keyword: &'a str,
    /// Decimal digits following the keyword, sign stripped.
    pub parameter: Option<&'a str>,
}

/// Result of lexing one backslash sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme<'a> {
    /// `\keyword[digits]` or `\<symbol>`.
    Control(ControlWord<'a>),
    /// `\'xx`, a byte awaiting charset translation.
    HexByte(u8),
}

/// Recoverable problem found while lexing.
#[derive(Debug, thiserror::Error)]
pub enum LexFault {
    /// The keyword ran past [`LexerLimits::max_keyword_len`].
    #[error("control word `\\{keyword}` exceeds {limit} letters")]
    KeywordTooLong {
        /// Keyword as read, truncated one past the limit.
        keyword: String,
        /// The cap that was exceeded.
        limit: usize,
    },
    /// The parameter ran past [`LexerLimits::max_parameter_len`].
    #[error("parameter of control word `\\{keyword}` exceeds {limit} digits")]
    ParameterTooLong {
        /// Keyword the parameter belongs to.
        keyword: String,
        /// The cap that was exceeded.
        limit: usize,
    },
    /// `\'` followed by something other than hex digits.
    #[error("hex escape `\\'{digits}` contains a non-hex character")]
    InvalidHexEscape {
        /// The characters read after `\'`.
        digits: String,
    },
    /// The cursor failed underneath the lexer.
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

enum Scan {
    Nothing,
    Control,
    Hex(u8),
}

/// Reads control words after the parser has consumed a `\`.
///
/// The keyword and parameter buffers are reused across calls.
#[derive(Debug, Default)]
pub struct Lexer {
    keyword: String,
    parameter: String,
    limits: LexerLimits,
}

impl Lexer {
    /// Create a lexer with the given length caps.
    pub fn new(limits: LexerLimits) -> Self {
        Self {
            keyword: String::with_capacity(limits.max_keyword_len + 1),
            parameter: String::with_capacity(limits.max_parameter_len + 1),
            limits,
        }
    }

    /// Lex one backslash sequence from `cursor`.
    ///
    /// Returns `None` when nothing should be dispatched: end of input inside
    /// the sequence, an overlong keyword or parameter, or a hex escape that
    /// produced no byte. Faults never abort lexing; they are handed back for
    /// the caller to report.
    pub fn lex<S: CharSource>(
        &mut self,
        cursor: &mut Cursor<S>,
    ) -> (Option<Lexeme<'_>>, Vec<LexFault>) {
        self.keyword.clear();
        self.parameter.clear();
        let mut faults = Vec::new();
        let lexeme = match self.scan(cursor, &mut faults) {
            Scan::Nothing => None,
            Scan::Hex(byte) => Some(Lexeme::HexByte(byte)),
            Scan::Control => Some(Lexeme::Control(ControlWord {
                keyword: &self.keyword,
                parameter: (!self.parameter.is_empty()).then_some(self.parameter.as_str()),
            })),
        };
        (lexeme, faults)
    }

    fn scan<S: CharSource>(&mut self, cursor: &mut Cursor<S>, faults: &mut Vec<LexFault>) -> Scan {
        let Some(first) = next(cursor, faults) else {
            return Scan::Nothing;
        };
        if !first.is_ascii_alphabetic() {
            if first == '\'' {
                return self.scan_hex(cursor, faults);
            }
            self.keyword.push(first);
            return Scan::Control;
        }

        self.keyword.push(first);
        let mut c = loop {
            let Some(c) = next(cursor, faults) else {
                return Scan::Nothing;
            };
            if !c.is_ascii_alphabetic() {
                break c;
            }
            if self.keyword.len() <= self.limits.max_keyword_len {
                self.keyword.push(c);
            }
        };

        if c == '-' {
            c = match next(cursor, faults) {
                Some(c) => c,
                None => return Scan::Nothing,
            };
        }
        if c.is_ascii_digit() {
            self.parameter.push(c);
            c = loop {
                let Some(d) = next(cursor, faults) else {
                    return Scan::Nothing;
                };
                if !d.is_ascii_digit() {
                    break d;
                }
                if self.parameter.len() <= self.limits.max_parameter_len {
                    self.parameter.push(d);
                }
            };
        }

        // `c` is the terminator. After `\u` it is usually the fallback
        // character, which is swallowed unless it is a letter (any script).
        let unicode = table::is_unicode_keyword(&self.keyword);
        let push_back = (!unicode && c != ' ') || (unicode && c.is_alphabetic()) || c == '\\';
        if push_back {
            unread(cursor, faults);
        }

        if self.keyword.len() > self.limits.max_keyword_len {
            faults.push(LexFault::KeywordTooLong {
                keyword: self.keyword.clone(),
                limit: self.limits.max_keyword_len,
            });
            return Scan::Nothing;
        }
        if self.parameter.len() > self.limits.max_parameter_len {
            faults.push(LexFault::ParameterTooLong {
                keyword: self.keyword.clone(),
                limit: self.limits.max_parameter_len,
            });
            return Scan::Nothing;
        }
        Scan::Control
    }

    fn scan_hex<S: CharSource>(
        &mut self,
        cursor: &mut Cursor<S>,
        faults: &mut Vec<LexFault>,
    ) -> Scan {
        for _ in 0..2 {
            let Some(c) = next(cursor, faults) else {
                return Scan::Nothing;
            };
            if c == '\\' {
                unread(cursor, faults);
                break;
            }
            self.parameter.push(c);
        }
        if self.parameter.is_empty() {
            return Scan::Nothing;
        }
        let mut value = 0u8;
        for c in self.parameter.chars() {
            let Some(digit) = c.to_digit(16) else {
                faults.push(LexFault::InvalidHexEscape {
                    digits: self.parameter.clone(),
                });
                return Scan::Nothing;
            };
            value = value * 16 + digit as u8;
        }
        Scan::Hex(value)
    }
}

fn next<S: CharSource>(cursor: &mut Cursor<S>, faults: &mut Vec<LexFault>) -> Option<char> {
    cursor.read().unwrap_or_else(|e| {
        faults.push(e.into());
        None
    })
}

fn unread<S: CharSource>(cursor: &mut Cursor<S>, faults: &mut Vec<LexFault>) {
    if let Err(e) = cursor.unread() {
        faults.push(e.into());
    }
}
