//! Latency benchmarks for home price estimation.
//!
//! # Benchmarks
//!
//! - `schema_location_lookup`: case-insensitive location lookup
//! - `feature_vector`: one-hot input assembly
//! - `linear_predict`: model evaluation only
//! - `estimate`: validation + assembly + prediction + rounding
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- estimate
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use home_price_inference::{
    ArtifactStore, ColumnSchema, EstimatorConfig, LinearModel, PriceEstimator, Regressor,
    SchemaConfig,
};
use ndarray::Array1;
use std::sync::Arc;

/// Schema with `n_locations` one-hot columns, sized like the Bangalore dataset.
fn schema(n_locations: usize) -> ColumnSchema {
    let mut columns = vec!["total_sqft".to_string(), "bath".to_string(), "bed".to_string()];
    columns.extend((0..n_locations).map(|i| format!("Location {}", i)));
    ColumnSchema::new(columns, &SchemaConfig::default()).unwrap()
}

fn model(n_columns: usize) -> LinearModel {
    let coefficients = (0..n_columns).map(|i| (i as f64 * 0.37).sin() * 50.0).collect();
    LinearModel::new(coefficients, 1000.0)
}

fn estimator(n_locations: usize) -> PriceEstimator {
    let schema = schema(n_locations);
    let model = model(schema.len());
    let store = ArtifactStore::preloaded(schema, Box::new(model)).unwrap();
    PriceEstimator::new(Arc::new(store), EstimatorConfig::default())
}

fn benchmark_schema(c: &mut Criterion) {
    let schema = schema(240);

    c.bench_function("schema_location_lookup", |b| {
        b.iter(|| schema.location_position(black_box("LOCATION 120")));
    });
}

fn benchmark_feature_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_vector");
    for n_locations in [10, 240, 1000] {
        let estimator = estimator(n_locations);
        group.bench_with_input(
            BenchmarkId::from_parameter(n_locations),
            &n_locations,
            |b, _| {
                b.iter(|| {
                    estimator.feature_vector(black_box("location 5"), black_box(1000.0), 2, 2)
                });
            },
        );
    }
    group.finish();
}

fn benchmark_predict(c: &mut Criterion) {
    let model = model(243);
    let x = Array1::<f64>::ones(243);

    c.bench_function("linear_predict", |b| {
        b.iter(|| model.predict(black_box(x.view())));
    });
}

fn benchmark_estimate(c: &mut Criterion) {
    let estimator = estimator(240);

    c.bench_function("estimate", |b| {
        b.iter(|| {
            estimator.estimate(
                black_box("Location 42"),
                black_box(1250.0),
                black_box(3),
                black_box(2),
            )
        });
    });
}

criterion_group!(
    benches,
    benchmark_schema,
    benchmark_feature_vector,
    benchmark_predict,
    benchmark_estimate,
);
criterion_main!(benches);
