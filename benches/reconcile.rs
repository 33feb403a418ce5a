use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use upc_merge::dataset::{Cell, Dataset};
use upc_merge::mapping::{AliasTable, ColumnResolver, ResolutionStrategy};
use upc_merge::pipeline::merge_datasets;
use upc_merge::record::catalog;

fn generate_catalog(rows: usize) -> Dataset {
    let data = (0..rows)
        .map(|i| {
            vec![
                Cell::text(format!("{:012}", i * 2)),
                Cell::text("ACME"),
                Cell::text(format!("Product {i}")),
                Cell::text(format!("Product {i}")),
                Cell::text("GROCERY"),
                Cell::text("PANTRY"),
                Cell::text("DRY GOODS"),
                Cell::text("Y"),
                Cell::text("N"),
            ]
        })
        .collect();
    Dataset::new(
        catalog::FIXED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        data,
    )
}

/// Half of the codes already exist in the catalog; they come unpadded.
fn generate_source(rows: usize) -> Dataset {
    let data = (0..rows)
        .map(|i| {
            vec![
                Cell::Integer(i as i64),
                Cell::text(format!("Item {i}")),
                Cell::text("house brand"),
                Cell::text("grocery"),
            ]
        })
        .collect();
    Dataset::new(
        ["UPC", "Product Name", "Brand", "Department"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        data,
    )
}

fn bench_merge(c: &mut Criterion) {
    let target = generate_catalog(100_000);
    let source = generate_source(20_000);
    let resolver = ColumnResolver::new(ResolutionStrategy::AliasSearch(AliasTable::default()));

    let mut group = c.benchmark_group("merge");
    group.bench_function("alias_search_100k_catalog", |b| {
        b.iter_batched(
            || (),
            |_| {
                let outcome =
                    merge_datasets(black_box(&source), black_box(&target), &resolver)
                        .expect("merge");
                black_box(outcome.merged.row_count())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
