use crate::descriptors::validate_pair;
use crate::{Error, Result};
use log::*;
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Squared distances more negative than this fraction of `‖a‖² + ‖b‖²` can't come from rounding.
const CANCELLATION_TOLERANCE: f32 = 1e-3;

/// Squared distances below this fraction of `‖a‖² + ‖b‖²` are recomputed from the differences.
const REFINE_FRACTION: f32 = 1e-2;

/// Pairwise L2 distances between descriptor set A (rows) and set B (columns).
///
/// Computing the matrix is the only `O(N1 * N2 * D)` step of matching, so it is
/// computed once and every strategy queries the same matrix in both directions.
/// This also guarantees that the `A -> B` and `B -> A` queries see exactly the
/// same numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    distances: Array2<f32>,
}

impl DistanceMatrix {
    /// Computes the distances between every descriptor of `a` and every descriptor of `b`.
    ///
    /// Both sets are `(N, D)` arrays with the same `D`. Either set may be empty.
    ///
    /// ```
    /// use ndarray::array;
    /// let a = array![[0.0f32, 0.0], [5.0, 5.0]];
    /// let b = array![[3.0f32, 4.0]];
    /// let matrix = cv_matching::DistanceMatrix::new(&a, &b).unwrap();
    /// assert_eq!(matrix.dim(), (2, 1));
    /// assert_eq!(matrix.get(0, 0), Some(5.0));
    /// ```
    pub fn new<'a, 'b>(
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Self> {
        let (a, b) = (a.into(), b.into());
        validate_pair(a, b)?;
        let distances = pairwise_distances(a, b)?;
        trace!("Distance matrix finished.");
        Ok(Self { distances })
    }

    /// `(N1, N2)`
    pub fn dim(&self) -> (usize, usize) {
        self.distances.dim()
    }

    /// Number of descriptors in set A.
    pub fn len_a(&self) -> usize {
        self.distances.nrows()
    }

    /// Number of descriptors in set B.
    pub fn len_b(&self) -> usize {
        self.distances.ncols()
    }

    /// The distance between descriptor `a` of set A and descriptor `b` of set B.
    pub fn get(&self, a: usize, b: usize) -> Option<f32> {
        self.distances.get((a, b)).copied()
    }

    /// Rows index set A and columns index set B.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.distances.view()
    }

    /// Rows index set B and columns index set A. No data is copied.
    pub fn transposed_view(&self) -> ArrayView2<'_, f32> {
        self.distances.t()
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.distances
    }
}

/// Uses the expansion `‖a - b‖² = ‖a‖² + ‖b‖² - 2 a·b`, one row of A at a time.
///
/// Entries where cancellation dominates are recomputed directly so that identical
/// descriptors are exactly zero apart.
fn pairwise_distances(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Result<Array2<f32>> {
    let mut distances = Array2::<f32>::zeros((a.nrows(), b.nrows()));
    if distances.is_empty() {
        return Ok(distances);
    }
    let b_norms: Vec<f32> = b.rows().into_iter().map(|row| row.dot(&row)).collect();
    trace!("Computed {} norms of set B.", b_norms.len());

    #[cfg(not(feature = "rayon"))]
    fill_rows(&mut distances, a, b, &b_norms)?;
    #[cfg(feature = "rayon")]
    fill_rows_parallel(&mut distances, a, b, &b_norms)?;
    Ok(distances)
}

#[cfg_attr(all(feature = "rayon", not(test)), allow(dead_code))]
fn fill_rows(
    distances: &mut Array2<f32>,
    a: ArrayView2<f32>,
    b: ArrayView2<f32>,
    b_norms: &[f32],
) -> Result<()> {
    distances
        .axis_iter_mut(Axis(0))
        .zip(a.rows())
        .enumerate()
        .try_for_each(|(ix, (out, a_row))| distance_row(ix, out, a_row, b, b_norms))
}

/// Rows are independent, so the result is identical to [`fill_rows`].
#[cfg(feature = "rayon")]
fn fill_rows_parallel(
    distances: &mut Array2<f32>,
    a: ArrayView2<f32>,
    b: ArrayView2<f32>,
    b_norms: &[f32],
) -> Result<()> {
    distances
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(a.axis_iter(Axis(0)).into_par_iter())
        .enumerate()
        .try_for_each(|(ix, (out, a_row))| distance_row(ix, out, a_row, b, b_norms))
}

fn distance_row(
    a_ix: usize,
    mut out: ArrayViewMut1<f32>,
    a_row: ArrayView1<f32>,
    b: ArrayView2<f32>,
    b_norms: &[f32],
) -> Result<()> {
    let a_norm = a_row.dot(&a_row);
    // out = -2 B a
    general_mat_vec_mul(-2.0, &b, &a_row, 0.0, &mut out);
    for ((b_ix, entry), &b_norm) in out.iter_mut().enumerate().zip(b_norms) {
        let norms = a_norm + b_norm;
        let squared = norms + *entry;
        if !squared.is_finite() {
            return Err(Error::DataInvariant(format!(
                "squared distance between A[{a_ix}] and B[{b_ix}] is not finite ({squared}); \
                 descriptor magnitudes overflow f32"
            )));
        }
        if squared < -CANCELLATION_TOLERANCE * norms {
            return Err(Error::DataInvariant(format!(
                "squared distance between A[{a_ix}] and B[{b_ix}] is {squared}, \
                 far below zero for squared norms summing to {norms}"
            )));
        }
        let squared = if squared <= REFINE_FRACTION * norms {
            squared_difference(a_row, b.row(b_ix))
        } else {
            squared
        };
        *entry = squared.max(0.0).sqrt();
    }
    Ok(())
}

fn squared_difference(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn euclidean_distances() {
        let a = array![[0.0f32, 0.0], [1.0, 1.0]];
        let b = array![[3.0f32, 4.0], [1.0, 1.0], [0.0, 0.0]];
        let matrix = DistanceMatrix::new(&a, &b).unwrap();
        assert_eq!(matrix.dim(), (2, 3));
        let expected = array![
            [5.0f32, 2.0f32.sqrt(), 0.0],
            [13.0f32.sqrt(), 0.0, 2.0f32.sqrt()]
        ];
        for (&d, &e) in matrix.view().iter().zip(expected.iter()) {
            assert_relative_eq!(d, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn duplicates_are_exactly_zero() {
        let a = array![[0.1f32, 0.7, 0.3333, 12.5], [1e3, -2e3, 0.5, 1e-3]];
        let matrix = DistanceMatrix::new(&a, &a).unwrap();
        assert_eq!(matrix.get(0, 0), Some(0.0));
        assert_eq!(matrix.get(1, 1), Some(0.0));
        assert!(matrix.get(0, 1).unwrap() > 0.0);
    }

    #[test]
    fn near_duplicates_keep_precision() {
        let a = array![[1000.0f32, 1000.0]];
        let b = array![[1000.0f32, 1000.125]];
        let matrix = DistanceMatrix::new(&a, &b).unwrap();
        assert_eq!(matrix.get(0, 0), Some(0.125));
    }

    #[test]
    fn transposed_view_swaps_sets() {
        let a = array![[0.0f32], [2.0], [7.0]];
        let b = array![[1.0f32], [4.0]];
        let ab = DistanceMatrix::new(&a, &b).unwrap();
        let ba = DistanceMatrix::new(&b, &a).unwrap();
        assert_eq!(ab.transposed_view(), ba.view());
    }

    #[test]
    fn empty_sets() {
        let a = Array2::<f32>::zeros((0, 4));
        let b = Array2::<f32>::zeros((3, 4));
        assert_eq!(DistanceMatrix::new(&a, &b).unwrap().dim(), (0, 3));
        assert_eq!(DistanceMatrix::new(&b, &a).unwrap().dim(), (3, 0));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_rows_equal_sequential_rows() {
        use rand::{Rng, SeedableRng};
        use rand_pcg::Pcg64;

        let mut rng = Pcg64::seed_from_u64(3);
        let a = Array2::from_shape_fn((97, 32), |_| rng.gen::<f32>());
        let mut b = Array2::from_shape_fn((61, 32), |_| rng.gen::<f32>());
        // Exact and near duplicates take the refinement path.
        b.row_mut(5).assign(&a.row(10));
        b.row_mut(6).assign(&a.row(11).mapv(|x| x + 1e-4));
        let b_norms: Vec<f32> = b.rows().into_iter().map(|row| row.dot(&row)).collect();

        let mut sequential = Array2::<f32>::zeros((a.nrows(), b.nrows()));
        fill_rows(&mut sequential, a.view(), b.view(), &b_norms).unwrap();
        let mut parallel = Array2::<f32>::zeros((a.nrows(), b.nrows()));
        fill_rows_parallel(&mut parallel, a.view(), b.view(), &b_norms).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(parallel[(10, 5)], 0.0);
        assert_eq!(DistanceMatrix::new(&a, &b).unwrap().into_inner(), parallel);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_rows_report_corruption() {
        let a = array![[0.0f32, 0.0], [1e30, 1e30], [1.0, 1.0]];
        let b = array![[0.0f32, 0.0]];
        let b_norms = [0.0f32];
        let mut parallel = Array2::<f32>::zeros((3, 1));
        assert!(matches!(
            fill_rows_parallel(&mut parallel, a.view(), b.view(), &b_norms),
            Err(Error::DataInvariant(_))
        ));
    }

    #[test]
    fn overflow_is_reported() {
        let a = array![[1e30f32, 1e30]];
        let b = array![[0.0f32, 0.0]];
        assert!(matches!(
            DistanceMatrix::new(&a, &b),
            Err(Error::DataInvariant(_))
        ));
    }
}
