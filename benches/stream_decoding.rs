//! Benchmarks for the wire codecs and channel analysis
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oscnet_rs::analysis::FftAnalyzer;
use oscnet_rs::protocol::telemetry::{encode_group, FramingPolicy, MAX_READ_PER_TICK};
use oscnet_rs::{CouplingMatrix, Edge, NetworkEditor, Node, SampleStreamDecoder};

/// `ticks` ticks of telemetry for `channels` channels
fn telemetry(channels: usize, ticks: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(channels * ticks * 3);
    for tick in 0..ticks {
        for ch in 0..channels {
            bytes.extend(encode_group(ch as u8, ((tick * 37 + ch * 512) % 4096) as u16));
        }
    }
    bytes
}

fn bench_decode_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_tick");

    for channels in [2usize, 8].iter() {
        let bytes = telemetry(*channels, 100);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        for framing in [FramingPolicy::Drop, FramingPolicy::Carry] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", framing), channels),
                &bytes,
                |b, bytes| {
                    let mut decoder = SampleStreamDecoder::new(*channels)
                        .with_framing(framing)
                        .with_max_samples(10_000);
                    b.iter(|| black_box(decoder.decode_bytes(bytes)));
                },
            );
        }
    }

    // one full-size read, split mid-group to exercise carrying
    let bytes = telemetry(8, MAX_READ_PER_TICK / 24);
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("carry_split_reads", |b| {
        let mut decoder = SampleStreamDecoder::new(8)
            .with_framing(FramingPolicy::Carry)
            .with_max_samples(10_000);
        b.iter(|| {
            for chunk in bytes.chunks(64) {
                black_box(decoder.decode_bytes(chunk));
            }
        });
    });

    group.finish();
}

fn ring_network(size: u32) -> NetworkEditor {
    let nodes = (1..=size).map(|id| Node::new(id, 1.0)).collect();
    let edges = (1..=size)
        .map(|id| Edge::new(id, id % size + 1, id % 2 == 0))
        .collect();
    let mut editor = NetworkEditor::default();
    if size > 1 {
        let _ = editor.replace_network(nodes, edges);
    }
    editor
}

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("coupling_matrix");

    for size in [8u32, 64, 256].iter() {
        let editor = ring_network(*size);
        let matrix = editor.coupling_matrix();
        let frame = matrix.encode();

        group.bench_with_input(BenchmarkId::new("build", size), &editor, |b, editor| {
            b.iter(|| black_box(editor.coupling_matrix()))
        });
        group.bench_with_input(BenchmarkId::new("encode", size), &matrix, |b, matrix| {
            b.iter(|| black_box(matrix.encode()))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &frame, |b, frame| {
            b.iter(|| black_box(CouplingMatrix::decode(frame)))
        });
    }

    group.finish();
}

fn bench_dominant_frequency(c: &mut Criterion) {
    let mut group = c.benchmark_group("dominant_frequency");

    for size in [1000usize, 10_000].iter() {
        let samples: Vec<f64> = (0..*size)
            .map(|i| 1.65 + (2.0 * std::f64::consts::PI * 1.5 * i as f64 / 100.0).sin())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            let mut analyzer = FftAnalyzer::new();
            b.iter(|| black_box(analyzer.dominant_frequency(samples, 100.0)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_ticks,
    bench_matrix,
    bench_dominant_frequency
);
criterion_main!(benches);
