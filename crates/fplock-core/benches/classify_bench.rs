//! Criterion benchmarks for verifier output classification.
//!
//! The verification loop classifies every line the verifier prints.  These
//! benchmarks keep that path cheap for both noisy and decisive lines.
//!
//! Run with:
//! ```bash
//! cargo bench --package fplock-core --bench classify_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fplock_core::classify_line;
use fplock_core::domain::verification::classify_lines;

// ── Line fixtures ─────────────────────────────────────────────────────────────

const LINES: &[(&str, &str)] = &[
    ("noise", "Using device /net/reactivated/Fprint/Device/0"),
    ("match", "Verify result: verify-match (done)"),
    ("no_match", "Verify result: verify-no-match (done)"),
    (
        "device_unavailable",
        "failed to claim device: GDBus.Error:net.reactivated.Fprint.Error.AlreadyInUse",
    ),
];

fn make_transcript(noise_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = (0..noise_lines)
        .map(|i| format!("Verifying: right-index-finger (attempt {i})"))
        .collect();
    lines.push("Verify result: verify-match (done)".to_string());
    lines
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_classify_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_line");
    for (name, line) in LINES {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| classify_line(black_box(line)))
        });
    }
    group.finish();
}

fn bench_classify_transcript(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_transcript");
    for noise in [0usize, 10, 100] {
        let transcript = make_transcript(noise);
        group.bench_with_input(
            BenchmarkId::from_parameter(noise),
            &transcript,
            |b, transcript| b.iter(|| classify_lines(black_box(transcript.iter()))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_classify_line, bench_classify_transcript);
criterion_main!(benches);
