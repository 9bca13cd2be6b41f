//! Generates the diagnostic tables from `spec/diagnostics.json`.
//!
//! Each entry of the data file describes one RTF stripping diagnostic. The
//! build emits four files into `OUT_DIR`:
//! - `generated_codes.rs`: one `pub const` per code plus `ALL`, every code
//!   in declaration order
//! - `generated_explain.rs`: `match` from code to its long description
//! - `generated_severity.rs`: `match` from code to its default severity
//! - `generated_context_keys.rs`: `match` from code to the context keys its
//!   diagnostics may carry
//!
//! Codes must read `RTF` plus four digits and appear in ascending order, so a
//! duplicate or misplaced entry fails the build.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Deserialize)]
struct DataFile {
    diagnostics: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    id: String,
    const_name: String,
    severity: Level,
    summary: String,
    description: String,
    #[serde(default)]
    context_keys: Vec<String>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum Level {
    Error,
    Warn,
    Info,
}

impl Level {
    fn variant(self) -> &'static str {
        match self {
            Level::Error => "Severity::Error",
            Level::Warn => "Severity::Warn",
            Level::Info => "Severity::Info",
        }
    }
}

fn main() {
    let data_path = Path::new("spec/diagnostics.json");
    println!("cargo:rerun-if-changed={}", data_path.display());

    let raw = fs::read_to_string(data_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", data_path.display()));
    let data: DataFile = serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("{} is malformed: {e}", data_path.display()));
    let entries = data.diagnostics;
    assert!(!entries.is_empty(), "diagnostics.json declares no diagnostics");

    for (i, entry) in entries.iter().enumerate() {
        check_entry(entry);
        if let Some(prev) = i.checked_sub(1).map(|p| &entries[p]) {
            assert!(
                prev.id < entry.id,
                "{}: codes must be unique and ascending (follows {})",
                entry.id,
                prev.id
            );
        }
    }
    let mut names: Vec<&str> = entries.iter().map(|e| e.const_name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
        panic!("constName {} is used twice", pair[0]);
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out = Path::new(&out_dir);

    write_out(out, "generated_codes.rs", &codes_module(&entries));
    write_out(
        out,
        "generated_explain.rs",
        &lookup(&entries, |e| format!("Some({:?})", e.description)),
    );
    write_out(
        out,
        "generated_severity.rs",
        &lookup(&entries, |e| format!("Some({})", e.severity.variant())),
    );
    write_out(
        out,
        "generated_context_keys.rs",
        &lookup(&entries, |e| format!("Some(&{:?})", e.context_keys)),
    );
}

fn check_entry(entry: &Entry) {
    let id = &entry.id;
    let digits = id.strip_prefix("RTF").unwrap_or_default();
    assert!(
        digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()),
        "{id}: code must be RTF followed by four digits"
    );
    let name = &entry.const_name;
    assert!(
        name.starts_with(|c: char| c.is_ascii_uppercase())
            && name
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'),
        "{id}: constName {name:?} is not SCREAMING_SNAKE_CASE"
    );
    assert!(
        !entry.summary.is_empty() && !entry.description.is_empty(),
        "{id}: summary and description are required"
    );
    for key in &entry.context_keys {
        assert!(
            !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase() || b == b'_'),
            "{id}: context key {key:?} must be lowercase"
        );
    }
}

fn codes_module(entries: &[Entry]) -> String {
    let mut src = String::from("// Generated from spec/diagnostics.json by build.rs.\n\n");
    for e in entries {
        let _ = writeln!(src, "/// {}", e.summary);
        let _ = writeln!(src, "pub const {}: &str = {:?};\n", e.const_name, e.id);
    }
    src.push_str("/// Every diagnostic code, in declaration order.\npub const ALL: &[&str] = &[\n");
    for e in entries {
        let _ = writeln!(src, "    {},", e.const_name);
    }
    src.push_str("];\n");
    src
}

/// A `match id { .. }` expression with one arm per entry and `None` otherwise.
fn lookup(entries: &[Entry], arm: impl Fn(&Entry) -> String) -> String {
    let mut src = String::from("match id {\n");
    for e in entries {
        let _ = writeln!(src, "    {:?} => {},", e.id, arm(e));
    }
    src.push_str("    _ => None,\n}\n");
    src
}

fn write_out(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
}
