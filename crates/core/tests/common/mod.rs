//! Shared test helpers for `rtf_strip_core` integration tests.

#![allow(unreachable_pub)]

use rtf_strip_core::{StripConfig, StripResult, strip_str};

/// A small document exercising every action kind.
#[allow(dead_code)]
pub const SAMPLE_DOC: &str = concat!(
    "{\\rtf1\\ansi\\ansicpg1252\\deff0",
    "{\\fonttbl{\\f0\\fswiss Helvetica;}{\\f1\\froman Times;}}",
    "{\\colortbl;\\red255\\green0\\blue0;}",
    "{\\*\\generator Writer 1.0;}",
    "{\\info{\\title Quarterly}{\\author Someone}}",
    "\\pard\\plain\\f0\\fs24 Caf\\'e9 \\emdash  ",
    "{\\b bold}\\tab next\\par\n",
    "{\\field{\\*\\fldinst HYPERLINK \"x\"}{\\fldrslt link}}",
    "\\u8364?\\line",
    "\\ldblquote quoted\\rdblquote\\par",
    "}"
);

/// Expected text for [`SAMPLE_DOC`].
#[allow(dead_code)]
pub const SAMPLE_TEXT: &str = "Caf\u{e9} \u{2014} bold\tnext\nlink\u{20ac}\n\u{201c}quoted\u{201d}\n";

/// Strip with default configuration.
#[allow(dead_code)]
pub fn strip(input: &str) -> StripResult {
    strip_str(input, &StripConfig::default())
}

/// Collect diagnostic codes from a result.
#[allow(dead_code)]
pub fn diag_codes(result: &StripResult) -> Vec<String> {
    result.diagnostics.iter().map(|d| d.id.to_string()).collect()
}

/// Assert that every diagnostic span lies inside the input.
#[allow(dead_code)]
pub fn assert_spans_in_bounds(result: &StripResult, input: &str) {
    let len = input.chars().count();
    for diag in &result.diagnostics {
        if let Some(span) = diag.span {
            assert!(
                span.start <= span.end,
                "Diagnostic span start ({}) > end ({}): {:?}",
                span.start,
                span.end,
                diag
            );
            assert!(
                span.end <= len,
                "Diagnostic span end ({}) > input length ({}): {:?}",
                span.end,
                len,
                diag
            );
        }
    }
}
