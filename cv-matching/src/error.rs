use thiserror::Error;

/// Errors raised by descriptor matching.
///
/// Every error is raised before any match is produced; there are no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The two descriptor sets disagree on dimensionality, a set has zero
    /// dimensions, or a set of rows is not rectangular.
    #[error("descriptor shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A parameter lies outside of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// An internal consistency check failed, which indicates corrupted input
    /// rather than floating point noise.
    #[error("data invariant violated: {0}")]
    DataInvariant(String),
}

impl Error {
    pub(crate) fn dimension_mismatch(a: usize, b: usize) -> Self {
        Self::ShapeMismatch(format!(
            "set A has descriptors of dimension {a} but set B has dimension {b}"
        ))
    }

    pub(crate) fn ragged_row(row: usize, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch(format!(
            "row {row} has {found} components but the first row has {expected}"
        ))
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
