use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use csv_reconcile::{Dataset, MergeMode, ReconcileConfig, Value, reconcile};

fn generate_pair(rows: usize) -> (Dataset, Dataset) {
    let columns = ["customer_id", "name", "phone", "city"]
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    let primary_rows = (0..rows)
        .map(|i| {
            vec![
                Value::text(format!("C{i:06}")),
                Value::text(format!("Customer {i}")),
                if i % 2 == 0 {
                    Value::Missing
                } else {
                    Value::text(format!("09{i:08}"))
                },
                if i % 3 == 0 {
                    Value::text("")
                } else {
                    Value::text("Hanoi")
                },
            ]
        })
        .collect();
    // Secondary covers the upper half of the primary keys plus as many new ones.
    let secondary_rows = (rows / 2..rows + rows / 2)
        .map(|i| {
            vec![
                Value::text(format!(" c{i:06} ")),
                Value::text(format!("Customer {i}")),
                Value::text(format!("08{i:08}")),
                Value::text("Hue"),
            ]
        })
        .collect();
    (
        Dataset::new(columns.clone(), primary_rows).expect("primary dataset"),
        Dataset::new(columns, secondary_rows).expect("secondary dataset"),
    )
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    for rows in [10_000usize, 50_000] {
        let (primary, secondary) = generate_pair(rows);
        for mode in [MergeMode::FillEmptyOnly, MergeMode::PreferSecondary] {
            let config = ReconcileConfig::new(vec!["customer_id".to_string()]).with_mode(mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), rows),
                &config,
                |b, config| {
                    b.iter_batched(
                        || (),
                        |_| reconcile(&primary, &secondary, config).expect("reconcile"),
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
