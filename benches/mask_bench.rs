// In cube-mask/benches/mask_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cube_mask::{
    BooleanArrayMask, CompareOp, ComparisonMask, CubeData, DataSource, Mask, Region,
};
use ndarray::{ArrayD, IxDyn};
use std::sync::Arc;

// --- Mock Data Generation ---

const SHAPE: [usize; 3] = [64, 128, 128];

/// A deterministic cube with a mix of positive and negative values.
fn generate_cube() -> Arc<dyn DataSource<f64>> {
    let values = ArrayD::from_shape_fn(IxDyn(&SHAPE), |idx| {
        ((idx[0] * 31 + idx[1] * 17 + idx[2] * 7) % 101) as f64 - 50.0
    });
    Arc::new(CubeData::dimensionless(values))
}

fn generate_eager_mask() -> Mask {
    let values = ArrayD::from_shape_fn(IxDyn(&SHAPE), |idx| (idx[0] + idx[1] + idx[2]) % 3 != 0);
    BooleanArrayMask::new(values, None).into()
}

// --- Benchmark Suite ---

fn bench_region_evaluation(c: &mut Criterion) {
    let data = generate_cube();
    let eager = generate_eager_mask();
    let lazy: Mask = ComparisonMask::new(Arc::clone(&data), CompareOp::Gt, 0.0, None).into();
    let combined = (&eager & &lazy).unwrap();

    let full = Region::full();
    let plane = Region::full().axis(32);

    let mut group = c.benchmark_group("Region Evaluation");

    group.bench_function("Eager (Full Cube)", |b| {
        b.iter(|| black_box(eager.include(black_box(&full)).unwrap()))
    });
    group.bench_function("Lazy Comparison (Full Cube)", |b| {
        b.iter(|| black_box(lazy.include(black_box(&full)).unwrap()))
    });
    group.bench_function("Eager (Single Plane)", |b| {
        b.iter(|| black_box(eager.include(black_box(&plane)).unwrap()))
    });
    group.bench_function("Lazy Comparison (Single Plane)", |b| {
        b.iter(|| black_box(lazy.include(black_box(&plane)).unwrap()))
    });
    group.bench_function("Eager AND Lazy (Single Plane)", |b| {
        b.iter(|| black_box(combined.include(black_box(&plane)).unwrap()))
    });

    group.finish();
}

fn bench_deep_composites(c: &mut Criterion) {
    let data = generate_cube();
    let region = Region::full().axis(0).axis(0..16);

    let mut group = c.benchmark_group("Composite Depth");
    for depth in [2usize, 16, 128] {
        let mut chain: Mask = ComparisonMask::new(Arc::clone(&data), CompareOp::Gt, -50.0, None).into();
        for step in 1..depth {
            let next: Mask =
                ComparisonMask::new(Arc::clone(&data), CompareOp::Lt, 50.0 + step as f64, None).into();
            chain = chain.and(&next).unwrap();
        }
        group.bench_function(format!("AND chain depth {depth}"), |b| {
            b.iter(|| black_box(chain.include(black_box(&region)).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_region_evaluation, bench_deep_composites);
criterion_main!(benches);
