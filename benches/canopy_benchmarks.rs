use canopy::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::rc::Rc;

const SPECIES: [&str; 8] = ["Elm", "Oak", "Plane", "Ash", "Birch", "Gum", "Pine", "Wattle"];

fn synthetic_csv(rows: usize) -> Vec<u8> {
    let mut out = String::from("Common Name,Year Planted,Diameter Breast Height,Latitude,Longitude\n");
    for i in 0..rows {
        let height = if i % 7 == 0 { String::new() } else { format!("{}.5", i % 90) };
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            SPECIES[i % SPECIES.len()],
            1950 + (i % 70),
            height,
            -37.8 - (i % 100) as f64 / 1000.0,
            144.9 + (i % 100) as f64 / 1000.0
        ));
    }
    out.into_bytes()
}

fn load(rows: usize) -> Rc<Dataset> {
    let bytes = synthetic_csv(rows);
    Rc::new(parse_delimited(&bytes, "bench", &ColumnRoles::default().normalized(), b',').unwrap())
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_delimited");

    for size in [1000, 10000, 100000].iter() {
        let bytes = synthetic_csv(*size);
        let roles = ColumnRoles::default().normalized();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| parse_delimited(black_box(&bytes), "bench", &roles, b',').unwrap());
        });
    }
    group.finish();
}

fn bench_cached_load(c: &mut Criterion) {
    let source = Source::buffer("bench", synthetic_csv(100000));
    let mut loader = DatasetLoader::new(ColumnRoles::default());
    loader.load(&source).unwrap();

    c.bench_function("cached_load_100k", |b| {
        b.iter(|| loader.load(black_box(&source)).unwrap());
    });
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [1000, 10000, 100000].iter() {
        let dataset = load(*size);
        let criteria = FilterCriteria::selecting(["Elm", "Oak", "Gum"])
            .with_range("year_planted", NumericRange::new(1970.0, 2000.0))
            .with_range("diameter_breast_height", NumericRange::new(10.0, 60.0));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| FilterEngine::apply(&dataset, black_box(&criteria)));
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let engine = AggregationEngine::default();

    for size in [1000, 10000, 100000].iter() {
        let dataset = load(*size);
        let view = FilteredView::all(&dataset);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| engine.counts(black_box(&view)));
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let dataset = load(10000);
    let view = FilterEngine::apply(&dataset, &FilterCriteria::selecting(SPECIES));

    c.bench_function("export_10k", |b| {
        b.iter(|| ExportService::serialize(black_box(&view)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_cached_load,
    bench_filter,
    bench_aggregate,
    bench_export
);
criterion_main!(benches);
