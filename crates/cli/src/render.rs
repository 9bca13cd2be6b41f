//! Pretty diagnostic rendering using ariadne.
//!
//! Converts stripping [`Diagnostic`]s into ariadne [`Report`]s for coloured,
//! source-annotated terminal output. Falls back to structured JSON when the
//! output is piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use rtf_strip_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for diagnostic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pick by whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|ctx| !ctx.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics in pretty (ariadne) format to stderr.
///
/// Spans are character offsets into `source`. Diagnostics without a span
/// are printed as standalone messages.
pub(crate) fn render_diagnostics_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default()
        .with_compact(false)
        .with_index_type(IndexType::Char);
    let source_len = source.chars().count();
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        let Some(span) = diag.span else {
            eprintln!("{}[{}]: {}", diag.severity, diag.id, diag.message);
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
            continue;
        };

        // Clamp so a truncated source never panics the renderer.
        let start = span.start.min(source_len);
        let end = span.end.min(source_len).max(start);

        let mut builder = Report::build(report_kind(diag.severity), (filename, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(make_label_message(diag))
                    .with_color(severity_color(diag.severity)),
            );
        if let Some(note) = context_note(diag) {
            builder = builder.with_note(note);
        }
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }
        builder.finish().eprint(&mut cache).ok();
    }
}

/// Label text: the context pairs when present, otherwise the message.
fn make_label_message(diag: &Diagnostic) -> String {
    context_note(diag).unwrap_or_else(|| diag.message.clone())
}

// ── Unified entry point ─────────────────────────────────────────────────

/// Render diagnostics in the given format.
///
/// JSON callers embed the diagnostics in their own document, so only the
/// pretty format prints anything here.
pub(crate) fn render_diagnostics(
    source: &str,
    filename: &str,
    diagnostics: &[Diagnostic],
    format: Format,
) {
    if format == Format::Pretty {
        render_diagnostics_pretty(source, filename, diagnostics);
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line such as `2 warnings, 1 info` to stderr.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for d in diagnostics {
        match d.severity {
            Severity::Error => errors += 1,
            Severity::Info => infos += 1,
            _ => warnings += 1,
        }
    }
    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtf_strip_diagnostics::codes;
    use std::collections::BTreeMap;

    #[test]
    fn explicit_format_wins() {
        assert_eq!(Format::resolve_or_detect(Some("json")), Format::Json);
        assert_eq!(Format::resolve_or_detect(Some("pretty")), Format::Pretty);
    }

    #[test]
    fn label_prefers_context() {
        let d = Diagnostic::warn(codes::PARAMETER_TOO_LONG, "parameter too long", None)
            .with_context(BTreeMap::from([
                ("keyword".into(), "fs".into()),
                ("limit".into(), "20".into()),
            ]));
        assert_eq!(make_label_message(&d), "keyword=fs, limit=20");

        let d = Diagnostic::warn(codes::UNMATCHED_GROUP_CLOSE, "stray }", None);
        assert_eq!(make_label_message(&d), "stray }");
    }

    #[test]
    fn pretty_render_tolerates_out_of_range_spans() {
        let d = Diagnostic::warn(
            codes::UNBALANCED_GROUPS,
            "groups open",
            Some(rtf_strip_diagnostics::Span::new(50, 80)),
        );
        render_diagnostics_pretty("{\\rtf1 caf\u{e9}", "t.rtf", &[d]);
    }
}
