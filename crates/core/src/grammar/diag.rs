pub use rtf_strip_diagnostics::{Diagnostic, Severity, Span, codes, explain};

/// `log` target used for diagnostics and engine tracing.
pub const LOG_TARGET: &str = "rtf_strip";

/// Sink for diagnostics raised while stripping.
pub trait Reporter {
    /// Accept one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Forwards diagnostics to the `log` facade under [`LOG_TARGET`], at the
/// level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        let level = match diagnostic.severity {
            Severity::Error => log::Level::Error,
            Severity::Info => log::Level::Info,
            _ => log::Level::Warn,
        };
        match diagnostic.span {
            Some(span) => log::log!(
                target: LOG_TARGET,
                level,
                "{diagnostic} (chars {}..{})",
                span.start,
                span.end
            ),
            None => log::log!(target: LOG_TARGET, level, "{diagnostic}"),
        }
    }
}
