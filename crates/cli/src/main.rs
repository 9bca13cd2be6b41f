mod render;

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use encoding_rs::Encoding;
use rtf_strip_core::{
    DecodeReader, Diagnostic, LogReporter, Reporter, Status, StripConfig, codes, strip_str,
    strip_with_reporter,
};
use rtf_strip_diagnostics as diag;

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "rtf-strip",
    version,
    about = "Extract the visible plain text of RTF documents"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log engine activity at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Strip an RTF file and write its plain text.
    Strip {
        /// Input file, or `-` for stdin.
        file: String,
        /// Copy input that is not RTF through unchanged instead of dropping it.
        #[arg(long)]
        copy_if_not_rtf: bool,
        /// Character encoding of the input bytes (any WHATWG label).
        #[arg(long, default_value = "utf-8")]
        encoding: String,
        /// Write the text here instead of stdout.
        #[arg(short = 'o', long = "out")]
        out: Option<String>,
    },

    /// Strip a file in memory and report its status and diagnostics.
    ///
    /// Exits with 0 (ok), 1 (corrupted) or 2 (not RTF).
    Check {
        file: String,
        /// Character encoding of the input bytes (any WHATWG label).
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },

    /// Explain a diagnostic ID (e.g. RTF1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Strip {
            file,
            copy_if_not_rtf,
            encoding,
            out,
        } => cmd_strip(&file, copy_if_not_rtf, &encoding, out.as_deref())?,
        Cmd::Check { file, encoding } => cmd_check(&file, &encoding, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_strip(file: &str, copy_if_not_rtf: bool, label: &str, out: Option<&str>) -> Result<()> {
    let encoding = resolve_encoding(label)?;
    let input: Box<dyn Read> = if file == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(file).with_context(|| format!("failed to open '{file}'"))?)
    };
    let sink: Box<dyn Write> = match out {
        Some(path) => {
            Box::new(File::create(path).with_context(|| format!("failed to create '{path}'"))?)
        }
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = BufWriter::new(sink);

    let config = StripConfig::default().copy_if_not_rtf(copy_if_not_rtf);
    let mut reporter = IoTally::default();
    let status = strip_with_reporter(
        DecodeReader::new(input, encoding),
        &mut sink,
        &config,
        &mut reporter,
    );
    log::debug!("stripped '{file}' with status {status}");

    if let Some(failure) = reporter.failure {
        bail!("stripping '{file}' failed: {}", failure.message);
    }
    sink.flush().context("failed to flush output")?;
    Ok(())
}

fn cmd_check(file: &str, label: &str, format: Format) -> Result<()> {
    let encoding = resolve_encoding(label)?;
    let bytes = fs::read(file).with_context(|| format!("failed to read '{file}'"))?;
    let (input, _, _) = encoding.decode(&bytes);
    let res = strip_str(&input, &StripConfig::default());
    let code = i32::from(res.status);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "status": res.status,
                "code": code,
                "diagnostics": res.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(&input, file, &res.diagnostics, format);
            print_summary(&res.diagnostics);
            eprintln!("{file}: {}", res.status);
        }
    }

    exit_with_status(res.status);
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let text = diag::explain(id);
            let out = serde_json::json!({
                "id": id,
                "explanation": text,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output, so it goes to stdout.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Forwards diagnostics to the log and keeps the first I/O failure.
#[derive(Default)]
struct IoTally {
    failure: Option<Diagnostic>,
}

impl Reporter for IoTally {
    fn report(&mut self, diagnostic: Diagnostic) {
        let io_failure =
            diagnostic.id == codes::INPUT_READ_FAILED || diagnostic.id == codes::OUTPUT_WRITE_FAILED;
        if io_failure && self.failure.is_none() {
            self.failure = Some(diagnostic.clone());
        }
        LogReporter.report(diagnostic);
    }
}

fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .with_context(|| format!("unknown encoding label '{label}'"))
}

/// Exit with the numeric status code unless the document parsed cleanly.
fn exit_with_status(status: Status) {
    if !status.is_ok() {
        process::exit(i32::from(status));
    }
}
