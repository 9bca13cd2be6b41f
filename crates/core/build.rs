//! Build script for the control-word dispatch table.
//!
//! Reads `spec/control_words.json` and generates:
//! - `generated_lookup.rs`: a `match` expression mapping each known keyword
//!   to its [`Action`](crate::table::Action)
//! - `generated_keywords.rs`: the sorted list of every known keyword
//!
//! The table is validated here so that a malformed data file fails the build
//! instead of misbehaving at run time: every keyword must be unique across
//! all action groups, insertion values must be exactly one character, and
//! named charsets must be one of `ansi`, `mac`, `pc`, `pca`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let data_path = Path::new("spec/control_words.json");
    println!("cargo:rerun-if-changed={}", data_path.display());

    let raw = fs::read_to_string(data_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", data_path.display()));
    let data: serde_json::Value =
        serde_json::from_str(&raw).expect("failed to parse control_words.json");

    // keyword → Rust expression for the action
    let mut arms: BTreeMap<String, String> = BTreeMap::new();
    let mut insert = |keyword: &str, action: String, group: &str| {
        assert!(
            !keyword.is_empty(),
            "control_words.json: empty keyword in `{group}`"
        );
        if let Some(previous) = arms.insert(keyword.to_string(), action) {
            panic!(
                "control_words.json: keyword {keyword:?} in `{group}` is already mapped to {previous}"
            );
        }
    };

    for keyword in string_list(&data, "unicode") {
        insert(keyword, "Action::UnicodeEscape".into(), "unicode");
    }
    for keyword in string_list(&data, "codepage") {
        insert(keyword, "Action::CharsetFromCodepage".into(), "codepage");
    }
    for keyword in string_list(&data, "text") {
        insert(keyword, "Action::TextDestination".into(), "text");
    }
    for keyword in string_list(&data, "noText") {
        insert(keyword, "Action::NoTextDestination".into(), "noText");
    }

    let charsets = data["charset"]
        .as_object()
        .expect("control_words.json: expected `charset` object");
    for (keyword, id) in charsets {
        let variant = match id.as_str() {
            Some("ansi") => "Ansi",
            Some("mac") => "Mac",
            Some("pc") => "Pc",
            Some("pca") => "Pca",
            other => panic!("control_words.json: charset.{keyword} has invalid id {other:?}"),
        };
        insert(
            keyword,
            format!("Action::CharsetDirective(NamedCharset::{variant})"),
            "charset",
        );
    }

    let insertions = data["insertion"]
        .as_object()
        .expect("control_words.json: expected `insertion` object");
    for (keyword, value) in insertions {
        let value = value
            .as_str()
            .unwrap_or_else(|| panic!("control_words.json: insertion.{keyword:?} must be a string"));
        let mut chars = value.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            panic!("control_words.json: insertion.{keyword:?} must be exactly one character");
        };
        let literal: String = c.escape_default().collect();
        insert(
            keyword,
            format!("Action::InsertionChar('{literal}')"),
            "insertion",
        );
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    // ── generated_lookup.rs ─────────────────────────────────────────────
    let mut lookup = String::from("match keyword {\n");
    for (keyword, action) in &arms {
        lookup.push_str(&format!(
            "    \"{}\" => Some({action}),\n",
            escape_rust_string_literal(keyword)
        ));
    }
    lookup.push_str("    _ => None,\n}\n");
    fs::write(out_path.join("generated_lookup.rs"), &lookup)
        .expect("failed to write generated_lookup.rs");

    // ── generated_keywords.rs ───────────────────────────────────────────
    let mut keywords = String::from("&[\n");
    for keyword in arms.keys() {
        keywords.push_str(&format!("    \"{}\",\n", escape_rust_string_literal(keyword)));
    }
    keywords.push_str("]\n");
    fs::write(out_path.join("generated_keywords.rs"), &keywords)
        .expect("failed to write generated_keywords.rs");
}

fn string_list<'a>(data: &'a serde_json::Value, key: &str) -> Vec<&'a str> {
    data[key]
        .as_array()
        .unwrap_or_else(|| panic!("control_words.json: expected `{key}` array"))
        .iter()
        .map(|v| {
            v.as_str()
                .unwrap_or_else(|| panic!("control_words.json: `{key}` entries must be strings"))
        })
        .collect()
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}
