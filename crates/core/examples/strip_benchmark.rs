//! Lightweight strip benchmark harness for local baselines.
//!
//! Run from repository root:
//! `cargo run -p rtf_strip_core --example strip_benchmark --release`

use std::fs;
use std::time::Instant;

use rtf_strip_core::{DecodeReader, NullReporter, StripConfig, strip_str, strip_with_reporter};

/// Build a large synthetic document by repeating the body of `sample`.
fn inflate(sample: &str, copies: usize) -> String {
    let body = sample
        .strip_prefix("{\\rtf1")
        .and_then(|s| s.trim_end().strip_suffix('}'))
        .unwrap_or(sample);
    let mut doc = String::with_capacity(body.len() * copies + 16);
    doc.push_str("{\\rtf1");
    for _ in 0..copies {
        doc.push('{');
        doc.push_str(body);
        doc.push('}');
    }
    doc.push('}');
    doc
}

fn run_benchmark(label: &str, input: &str, iterations: usize) {
    let config = StripConfig::default();

    let str_start = Instant::now();
    for _ in 0..iterations {
        let _ = strip_str(input, &config);
    }
    let str_elapsed = str_start.elapsed();

    let stream_start = Instant::now();
    for _ in 0..iterations {
        let mut sink = std::io::sink();
        let _ = strip_with_reporter(
            DecodeReader::utf8(input.as_bytes()),
            &mut sink,
            &config,
            &mut NullReporter,
        );
    }
    let stream_elapsed = stream_start.elapsed();

    println!("Benchmark: {label}");
    println!("  input_bytes: {}", input.len());
    println!(
        "  strip_str: total={:?}, per_iter={:.3} ms",
        str_elapsed,
        str_elapsed.as_secs_f64() * 1000.0 / iterations as f64
    );
    println!(
        "  streaming: total={:?}, per_iter={:.3} ms",
        stream_elapsed,
        stream_elapsed.as_secs_f64() * 1000.0 / iterations as f64
    );
}

fn main() -> Result<(), String> {
    let iterations = std::env::var("RTF_STRIP_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(500);

    let path = "samples/letter.rtf";
    let sample =
        fs::read_to_string(path).map_err(|e| format!("failed to read sample '{path}': {e}"))?;

    run_benchmark("letter", &sample, iterations);
    run_benchmark("letter_x200", &inflate(&sample, 200), iterations / 10 + 1);

    Ok(())
}
