//! Diagnostics for rtf-strip.
//!
//! Provides [`Diagnostic`], [`Severity`], and [`Span`], the payload the
//! stripping engine hands to its warning sink whenever it recovers from
//! malformed input. Diagnostic codes are defined in the [`codes`] module and
//! described by [`explain`].

#![warn(missing_docs)]

/// Diagnostic ID constants auto-generated from `spec/diagnostics.json`.
pub mod codes {
    include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Severity level for a diagnostic message.
///
/// Any `Warn` or `Error` diagnostic raised while stripping marks the
/// document as corrupted; `Info` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error.
    Error,
    /// Malformed input; extraction degraded.
    Warn,
    /// Informational note.
    Info,
}

impl Severity {
    /// Whether a diagnostic of this severity downgrades the strip status.
    pub fn is_corruption(self) -> bool {
        matches!(self, Severity::Error | Severity::Warn)
    }
}

/// Character span in the decoded input.
///
/// Offsets count characters (Unicode scalar values), not bytes, because the
/// engine consumes an already-decoded character stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Offset of the first character (0-based).
    pub start: usize,
    /// Offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A diagnostic message produced while stripping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"RTF1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional character span in the input that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Create a diagnostic whose severity is the code's default from
    /// `spec/diagnostics.json`.
    ///
    /// Unknown codes fall back to [`Severity::Warn`].
    pub fn for_code(id: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        let severity = default_severity(id).unwrap_or(Severity::Warn);
        Self::new(id, severity, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Info, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Keys are short descriptors like `"keyword"`, `"charset"`, `"depth"`.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
///
/// Auto-generated from `spec/diagnostics.json` at build time.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Returns the default severity declared for a diagnostic code, if known.
pub fn default_severity(id: &str) -> Option<Severity> {
    include!(concat!(env!("OUT_DIR"), "/generated_severity.rs"))
}

/// Returns the context keys a diagnostic code may attach, if the code is known.
pub fn context_keys(id: &str) -> Option<&'static [&'static str]> {
    include!(concat!(env!("OUT_DIR"), "/generated_context_keys.rs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Span ────────────────────────────────────────────────────────────

    #[test]
    fn span_new_valid() {
        let s = Span::new(5, 10);
        assert_eq!(s.start, 5);
        assert_eq!(s.end, 10);
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
    }

    #[test]
    fn span_empty() {
        let s = Span::empty(7);
        assert_eq!(s.start, 7);
        assert_eq!(s.end, 7);
        assert!(s.is_empty());
    }

    #[test]
    #[should_panic(expected = "Span end (3) < start (5)")]
    fn span_new_inverted_panics() {
        Span::new(5, 3);
    }

    // ── Severity ────────────────────────────────────────────────────────

    #[test]
    fn severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warn), "warn");
        assert_eq!(format!("{}", Severity::Info), "info");
    }

    #[test]
    fn only_info_is_not_corruption() {
        assert!(Severity::Error.is_corruption());
        assert!(Severity::Warn.is_corruption());
        assert!(!Severity::Info.is_corruption());
    }

    // ── Diagnostic constructors ─────────────────────────────────────────

    #[test]
    fn diagnostic_warn_constructor() {
        let d = Diagnostic::warn(codes::UNMATCHED_GROUP_CLOSE, "stray }", Some(Span::new(3, 4)));
        assert_eq!(d.id, "RTF1001");
        assert_eq!(d.severity, Severity::Warn);
        assert_eq!(d.message, "stray }");
        assert_eq!(d.span, Some(Span::new(3, 4)));
    }

    #[test]
    fn diagnostic_info_constructor() {
        let d = Diagnostic::info("CUSTOM", "custom message", None);
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.id, "CUSTOM");
    }

    #[test]
    fn for_code_uses_declared_severity() {
        let d = Diagnostic::for_code(codes::NOT_RTF, "not rtf", None);
        assert_eq!(d.severity, Severity::Info);
        let d = Diagnostic::for_code(codes::INVALID_HEX_ESCAPE, "bad hex", None);
        assert_eq!(d.severity, Severity::Warn);
    }

    #[test]
    fn for_code_unknown_falls_back_to_warn() {
        let d = Diagnostic::for_code("RTF9999", "mystery", None);
        assert_eq!(d.severity, Severity::Warn);
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::warn(codes::KEYWORD_TOO_LONG, "control word too long", None);
        assert_eq!(format!("{}", d), "warn[RTF1101]: control word too long");
    }

    // ── explain() / default_severity() ──────────────────────────────────

    #[test]
    fn diagnostic_explain_known() {
        let d = Diagnostic::warn(codes::UNBALANCED_GROUPS, "test", None);
        assert!(d.explain().unwrap().contains("still open"));
    }

    #[test]
    fn diagnostic_explain_unknown() {
        let d = Diagnostic::warn("UNKNOWN_CODE", "test", None);
        assert!(d.explain().is_none());
    }

    #[test]
    fn all_codes_have_explanations_and_severities() {
        assert_eq!(codes::ALL.len(), 11);
        for &code in codes::ALL {
            assert!(
                explain(code).is_some(),
                "diagnostic code {code} has no explain() entry"
            );
            assert!(
                default_severity(code).is_some(),
                "diagnostic code {code} has no default severity"
            );
        }
    }

    #[test]
    fn all_lists_codes_in_declaration_order() {
        assert_eq!(codes::ALL.first(), Some(&codes::UNMATCHED_GROUP_CLOSE));
        assert_eq!(codes::ALL.last(), Some(&codes::NOT_RTF));
        assert!(codes::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn context_keys_follow_the_data_file() {
        assert_eq!(context_keys(codes::UNBALANCED_GROUPS), Some(&["depth"][..]));
        assert_eq!(
            context_keys(codes::KEYWORD_TOO_LONG),
            Some(&["keyword", "limit"][..])
        );
        assert_eq!(context_keys(codes::NOT_RTF), Some(&[][..]));
        assert_eq!(context_keys("RTF9999"), None);
    }

    // ── Serde ───────────────────────────────────────────────────────────

    #[test]
    fn diagnostic_serde_roundtrip() {
        let d = Diagnostic::warn(codes::INVALID_HEX_ESCAPE, "bad hex", Some(Span::new(10, 13)));
        let json = serde_json::to_string(&d).unwrap();
        let d2: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, d2);
    }

    #[test]
    fn diagnostic_serde_omits_none_fields() {
        let d = Diagnostic::warn(codes::CURSOR_UNREAD, "test", None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("span"), "None span should be omitted: {json}");
        assert!(
            !json.contains("context"),
            "None context should be omitted: {json}"
        );
        assert!(json.contains("\"severity\":\"warn\""), "{json}");
    }

    #[test]
    fn diagnostic_context_deterministic_order() {
        let d = Diagnostic::warn(codes::KEYWORD_TOO_LONG, "test", None).with_context(
            BTreeMap::from([
                ("limit".into(), "30".into()),
                ("keyword".into(), "abc".into()),
            ]),
        );
        let json = serde_json::to_string(&d).unwrap();
        let k = json.find("keyword").unwrap();
        let l = json.find("limit").unwrap();
        assert!(k < l, "BTreeMap should serialize in key order: {json}");
    }
}
