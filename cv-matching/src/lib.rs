//! # Descriptor matching
//!
//! Given two sets of feature descriptors, typically extracted from two images, this crate
//! finds which descriptor of the first set corresponds to which descriptor of the second.
//! Descriptors are dense `f32` vectors passed as `(N, D)` [`ndarray`] arrays, and distances
//! are Euclidean (L2). The search is exact brute force, which is appropriate for the few
//! thousand features per image that typical feature extractors produce.
//!
//! Four strategies are provided, in increasing order of selectivity:
//!
//! * [`match_nn`] - every descriptor of A matches its nearest neighbor in B.
//! * [`match_snn`] - nearest neighbors that pass Lowe's ratio test, i.e. the nearest
//!   distance is at most `th` times the second nearest distance.
//! * [`match_mnn`] - mutual nearest neighbors, where A's descriptor is also the nearest
//!   neighbor of its match in B.
//! * [`match_smnn`] - mutual nearest neighbors that pass the ratio test in both directions.
//!
//! NN and MNN score matches by distance and SNN and SMNN score them by ratio. Matches are
//! always sorted by ascending score. When several candidates are equally close, the one
//! with the lowest index wins, so results are reproducible.
//!
//! All strategies are computed from a single [`DistanceMatrix`]. If several strategies are
//! needed for the same pair of sets, compute the matrix once and call its methods or
//! [`Matcher::run_on`].
//!
//! ```
//! use ndarray::array;
//! let a = array![[0.0f32, 0.0], [5.0, 5.0]];
//! let b = array![[0.0f32, 0.0], [5.0, 5.0], [10.0, 10.0]];
//! let matches = cv_matching::match_nn(&a, &b).unwrap();
//! assert_eq!(matches.pairs(), &[[0, 0], [1, 1]]);
//! assert_eq!(matches.scores(), &[0.0, 0.0]);
//! ```

mod descriptors;
mod distance;
mod error;
mod matcher;
mod matches;
pub mod mutual;
pub mod neighbors;
pub mod ratio;

pub use descriptors::descriptors_from_rows;
pub use distance::DistanceMatrix;
pub use error::{Error, Result};
pub use matcher::{Matcher, Strategy};
pub use matches::{DescriptorMatch, Matches};
pub use ndarray;
pub use ratio::DEFAULT_RATIO_THRESHOLD;

use ndarray::ArrayView2;

/// Matches every descriptor of `a` to its nearest neighbor in `b`.
///
/// Scores are L2 distances. Each index of `a` appears exactly once unless `b` is empty.
pub fn match_nn<'a, 'b>(
    a: impl Into<ArrayView2<'a, f32>>,
    b: impl Into<ArrayView2<'b, f32>>,
) -> Result<Matches> {
    Matcher::default().nn(a, b)
}

/// Matches descriptors of `a` to their nearest neighbor in `b` if the ratio of the first to
/// the second nearest distance is at most `th`.
///
/// Scores are the ratios. `th` must lie in `(0, 1]`; [`DEFAULT_RATIO_THRESHOLD`] is `0.8`.
/// When `b` has a single descriptor the ratio is `0` and every match passes.
pub fn match_snn<'a, 'b>(
    a: impl Into<ArrayView2<'a, f32>>,
    b: impl Into<ArrayView2<'b, f32>>,
    th: f32,
) -> Result<Matches> {
    Matcher::new(th).snn(a, b)
}

/// Matches descriptors which are each other's nearest neighbor.
///
/// Scores are L2 distances. Every index of `a` and of `b` appears at most once.
pub fn match_mnn<'a, 'b>(
    a: impl Into<ArrayView2<'a, f32>>,
    b: impl Into<ArrayView2<'b, f32>>,
) -> Result<Matches> {
    Matcher::default().mnn(a, b)
}

/// Matches mutual nearest neighbors which also pass the ratio test from `a` to `b` and
/// from `b` to `a`.
///
/// Scores are the larger of the two ratios. This is the intersection of [`match_mnn`],
/// [`match_snn`] on `(a, b)` and [`match_snn`] on `(b, a)`.
pub fn match_smnn<'a, 'b>(
    a: impl Into<ArrayView2<'a, f32>>,
    b: impl Into<ArrayView2<'b, f32>>,
    th: f32,
) -> Result<Matches> {
    Matcher::new(th).smnn(a, b)
}
