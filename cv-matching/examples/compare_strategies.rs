use cv_matching::{DistanceMatrix, Matcher, Strategy};
use ndarray::{s, Array2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const FEATURES: usize = 500;
const DIMENSION: usize = 64;
const NOISE: f32 = 0.05;

/// Matches a random descriptor set against a noisy, shuffled copy of its first half
/// plus as many unrelated descriptors, and reports how each strategy fares.
fn main() {
    pretty_env_logger::init_timed();
    let mut rng = Pcg64::from_seed([1; 32]);
    let a = Array2::from_shape_fn((FEATURES, DIMENSION), |_| rng.gen::<f32>());

    let shared = FEATURES / 2;
    let mut permutation: Vec<usize> = (0..FEATURES).collect();
    permutation.shuffle(&mut rng);
    let mut b = Array2::from_shape_fn((FEATURES, DIMENSION), |_| rng.gen::<f32>());
    for (row, &source) in permutation[..shared].iter().enumerate() {
        let mut target = b.slice_mut(s![row, ..]);
        target.assign(&a.row(source));
        target.mapv_inplace(|x| x + rng.gen_range(-NOISE..NOISE));
    }
    // Row `row` of B is a copy of A[permutation[row]] for the first `shared` rows.
    let correct = |a_ix: usize, b_ix: usize| b_ix < shared && permutation[b_ix] == a_ix;

    let matrix = DistanceMatrix::new(&a, &b).expect("descriptors are valid");
    let matcher = Matcher::default();
    for strategy in Strategy::ALL {
        let matches = matcher
            .run_on(strategy, &matrix)
            .expect("threshold is valid");
        let inliers = matches.iter().filter(|m| correct(m.a, m.b)).count();
        println!(
            "{:>5}: {:>4} matches, {:>4} correct ({:.1}% precision)",
            strategy.to_string(),
            matches.len(),
            inliers,
            100.0 * inliers as f32 / matches.len().max(1) as f32
        );
    }
}
