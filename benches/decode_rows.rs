use achilles_decoder::decoder::ResultDecoder;
use achilles_decoder::model::ResultRow;
use achilles_decoder::test_fixtures::{sample_catalog, sample_vocabulary, standard_row};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Mixed snapshot: half coded demographics, half non-coded literals,
/// roughly the shape of a real results table.
fn make_rows(size: usize) -> Vec<ResultRow> {
    (0..size)
        .map(|i| match i % 4 {
            0 => standard_row(2, &["8507"], 10),
            1 => standard_row(2, &["8532"], 10),
            2 => standard_row(3, &["1990"], 5),
            _ => standard_row(1100, &["941"], 2),
        })
        .collect()
}

fn benchmark_decode(c: &mut Criterion) {
    let catalog = sample_catalog();
    let vocabulary = sample_vocabulary();
    let decoder = ResultDecoder::new(&catalog, &vocabulary);

    let mut group = c.benchmark_group("decode_rows");

    for size in [1_000usize, 10_000, 100_000] {
        let rows = make_rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let output = decoder.decode(black_box(rows.clone())).expect("decode");
                black_box(output.summary.rows);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_decode);
criterion_main!(benches);
