use crate::{Error, Result};
use log::*;
use ndarray::{Array2, ArrayView2};

/// Builds a dense `(N, D)` descriptor set from a slice of rows.
///
/// Every row must have the same number of components. An empty slice produces
/// a `(0, 0)` set, which matches against anything and yields no matches.
///
/// ```
/// let set = cv_matching::descriptors_from_rows(&[vec![0.0f32, 1.0], vec![2.0, 3.0]]).unwrap();
/// assert_eq!(set.dim(), (2, 2));
/// assert!(cv_matching::descriptors_from_rows(&[vec![0.0f32, 1.0], vec![2.0]]).is_err());
/// ```
pub fn descriptors_from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Array2<f32>> {
    let dimension = rows.first().map_or(0, |row| row.as_ref().len());
    let mut data = Vec::with_capacity(rows.len() * dimension);
    for (ix, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != dimension {
            return Err(Error::ragged_row(ix, dimension, row.len()));
        }
        data.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), dimension), data)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))
}

/// Checks that the two descriptor sets can be matched against each other.
///
/// Returns the shared descriptor dimension. Only a `(0, 0)` set, such as one built
/// from no rows, has an unknown dimension and adopts the dimension of the other set.
pub(crate) fn validate_pair(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Result<usize> {
    let unknown = |set: ArrayView2<f32>| set.dim() == (0, 0);
    let dimension = match (a.ncols(), b.ncols()) {
        (_, db) if unknown(a) => db,
        (da, _) if unknown(b) => da,
        (da, db) if da != db => return Err(Error::dimension_mismatch(da, db)),
        (da, _) => da,
    };
    if dimension == 0 && (a.nrows() > 0 || b.nrows() > 0) {
        return Err(Error::ShapeMismatch(
            "descriptors must have at least one dimension".into(),
        ));
    }
    check_finite("A", a)?;
    check_finite("B", b)?;
    debug!(
        "Matching {} descriptors against {} descriptors of dimension {}",
        a.nrows(),
        b.nrows(),
        dimension
    );
    Ok(dimension)
}

/// Non-finite components can't produce a meaningful distance, so they are treated as corruption.
fn check_finite(set: &str, descriptors: ArrayView2<f32>) -> Result<()> {
    match descriptors
        .indexed_iter()
        .find(|&(_, value)| !value.is_finite())
    {
        Some(((row, col), value)) => Err(Error::DataInvariant(format!(
            "descriptor {row} of set {set} has non-finite component {value} at index {col}"
        ))),
        None => Ok(()),
    }
}
