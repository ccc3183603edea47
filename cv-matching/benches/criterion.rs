use criterion::{criterion_group, criterion_main, Criterion};
use cv_matching::{DistanceMatrix, Matcher, Strategy};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// SIFT-sized float descriptors.
fn random_descriptors(rng: &mut Pcg64, rows: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, 128), |_| rng.gen::<f32>())
}

fn load_sets() -> (Array2<f32>, Array2<f32>) {
    let mut rng = Pcg64::from_seed([1; 32]);
    (
        random_descriptors(&mut rng, 1000),
        random_descriptors(&mut rng, 1200),
    )
}

fn distance_matrix(c: &mut Criterion) {
    let (a, b) = load_sets();
    c.bench_function("distance_matrix", |bench| {
        bench.iter(|| DistanceMatrix::new(&a, &b).unwrap())
    });
}

fn strategies(c: &mut Criterion) {
    let (a, b) = load_sets();
    let matrix = DistanceMatrix::new(&a, &b).unwrap();
    let matcher = Matcher::default();
    for strategy in Strategy::ALL {
        c.bench_function(&format!("{strategy}_on_matrix"), |bench| {
            bench.iter(|| matcher.run_on(strategy, &matrix).unwrap())
        });
    }
}

fn end_to_end(c: &mut Criterion) {
    let (a, b) = load_sets();
    let matcher = Matcher::default();
    c.bench_function("smnn_end_to_end", |bench| {
        bench.iter(|| matcher.run(Strategy::Smnn, &a, &b).unwrap())
    });
}

criterion_group!(
    name = matching;
    config = Criterion::default().sample_size(10);
    targets = distance_matrix, strategies, end_to_end
);

criterion_main!(matching);
