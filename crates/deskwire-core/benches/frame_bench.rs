//! Criterion benchmarks for the `OFRA` video frame decoder.
//!
//! Frames arrive at display refresh rate, so header decoding sits on the
//! receive hot path.  Decoding borrows the payload and must not scale with
//! payload size.
//!
//! Run with:
//! ```bash
//! cargo bench --package deskwire-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deskwire_core::protocol::frame::decode_frame;

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_frame(payload_len: usize) -> Vec<u8> {
    let mut buf = b"OFRA".to_vec();
    buf.extend_from_slice(&1920u32.to_le_bytes());
    buf.extend_from_slice(&1080u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.resize(buf.len() + payload_len, 0xAB);
    buf
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `decode_frame` across typical JPEG payload sizes.
fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for size in [0usize, 16 * 1024, 256 * 1024, 2 * 1024 * 1024] {
        let frame = make_frame(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| decode_frame(black_box(frame)).unwrap().payload.len())
        });
    }
    group.finish();
}

/// Benchmarks the rejection path for non-frame binary messages.
fn bench_reject_bad_magic(c: &mut Criterion) {
    let mut frame = make_frame(1024);
    frame[..4].copy_from_slice(b"JFIF");
    c.bench_function("decode_frame_bad_magic", |b| {
        b.iter(|| decode_frame(black_box(&frame)).is_err())
    });
}

criterion_group!(benches, bench_decode_frame, bench_reject_bad_magic);
criterion_main!(benches);
