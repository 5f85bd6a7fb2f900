//! Whole-batch vs chunked vs parallel aggregation over a synthetic export.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{RecordBatch, Schema};
use pivot_engine::{
    process_batch, process_source, FilterSpec, MemorySource, NullDiagnostics, PipelineOptions,
};

fn synthetic_export(rows: usize) -> RecordBatch {
    let schema = Schema::new(["Source", "Destination", "Anchor", "Follow"]);
    let records = (0..rows)
        .map(|i| {
            vec![
                format!("https://shop.example/page/{}", i % 997),
                format!("https://shop.example/category/{}/item", i % 131),
                match i % 9 {
                    0 => "Menu".to_string(),
                    1 => String::new(),
                    n => format!("Anchor {}", n * (i % 17)),
                },
                if i % 3 == 0 { "false" } else { "true" }.to_string(),
            ]
        })
        .collect();
    RecordBatch::from_records(schema, records)
}

fn bench_aggregation(c: &mut Criterion) {
    let compiled = FilterSpec::new("Destination", "Anchor")
        .with_main_exclude(r"category/13\/")
        .with_secondary_exclude("Menu|Account")
        .with_filter("Follow", "true|false")
        .compile()
        .expect("valid spec");

    let mut group = c.benchmark_group("aggregation");
    for &rows in &[10_000usize, 100_000] {
        let batch = synthetic_export(rows);

        group.bench_with_input(BenchmarkId::new("whole", rows), &batch, |b, batch| {
            b.iter(|| process_batch(black_box(batch), &compiled, &NullDiagnostics).unwrap())
        });

        for &workers in &[1usize, 4] {
            let options = PipelineOptions {
                chunk_rows: 5_000,
                chunk_threshold_bytes: 0,
                workers,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("chunked_w{}", workers), rows),
                &batch,
                |b, batch| {
                    b.iter(|| {
                        let mut source = MemorySource::new(batch.clone()).with_size_hint(1);
                        process_source(&mut source, &compiled, &options, &NullDiagnostics).unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_aggregation);
criterion_main!(benches);
