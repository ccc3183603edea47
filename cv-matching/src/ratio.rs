use crate::neighbors::Neighbors;
use crate::{Error, Result};

/// The first to second nearest neighbor ratio used when none is given.
pub const DEFAULT_RATIO_THRESHOLD: f32 = 0.8;

/// A query whose nearest neighbor passed the ratio test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioMatch {
    pub neighbor: usize,
    pub ratio: f32,
}

/// Accepts thresholds in `(0, 1]`. NaN is rejected.
pub fn validate_threshold(threshold: f32) -> Result<f32> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        Err(Error::InvalidParameter {
            name: "threshold",
            reason: format!("{threshold} is outside of (0, 1]"),
        })
    }
}

/// The ratio `d1 / d2` between the first and second nearest distances.
///
/// * A missing second neighbor is passed as `d2 = ∞`, so the ratio is `0` and
///   the test always passes.
/// * `d1 = d2 = 0` means the query has (at least) two exact duplicates, which are
///   considered perfect matches with a ratio of `0`.
/// * `d2 = 0` with `d1 > 0` can't happen for a metric and is an error.
pub fn distance_ratio(d1: f32, d2: f32) -> Result<f32> {
    if d2 == 0.0 {
        if d1 == 0.0 {
            Ok(0.0)
        } else {
            Err(Error::DataInvariant(format!(
                "second nearest distance is zero but the nearest distance is {d1}"
            )))
        }
    } else {
        Ok(d1 / d2)
    }
}

/// Applies the ratio test to every query.
///
/// The output is indexed by query, with `None` for queries that failed the test.
pub fn ratio_filter(neighbors: &[Neighbors], threshold: f32) -> Result<Vec<Option<RatioMatch>>> {
    let threshold = validate_threshold(threshold)?;
    neighbors
        .iter()
        .map(|n| {
            let ratio = distance_ratio(n.first.distance, n.second_distance())?;
            Ok((ratio <= threshold).then_some(RatioMatch {
                neighbor: n.first.index,
                ratio,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::Neighbor;
    use test_case::test_case;

    fn neighbors(d1: f32, d2: Option<f32>) -> Neighbors {
        Neighbors {
            first: Neighbor {
                index: 3,
                distance: d1,
            },
            second: d2.map(|distance| Neighbor { index: 5, distance }),
        }
    }

    #[test_case(0.8 ; "default")]
    #[test_case(1.0 ; "upper bound")]
    #[test_case(1e-6 ; "tiny")]
    fn valid_thresholds(threshold: f32) {
        assert_eq!(validate_threshold(threshold), Ok(threshold));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-0.5 ; "negative")]
    #[test_case(1.0001 ; "above one")]
    #[test_case(f32::NAN ; "nan")]
    #[test_case(f32::INFINITY ; "infinite")]
    fn invalid_thresholds(threshold: f32) {
        assert!(matches!(
            validate_threshold(threshold),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn ratio_of_distances() {
        assert_eq!(distance_ratio(1.0, 4.0), Ok(0.25));
        assert_eq!(distance_ratio(2.0, f32::INFINITY), Ok(0.0));
        assert_eq!(distance_ratio(0.0, 0.0), Ok(0.0));
    }

    #[test]
    fn zero_second_distance_with_nonzero_first_is_an_error() {
        assert!(matches!(
            distance_ratio(0.5, 0.0),
            Err(Error::DataInvariant(_))
        ));
    }

    #[test]
    fn filter_keeps_ratios_up_to_threshold() {
        let queries = [
            neighbors(1.0, Some(2.0)),
            neighbors(4.0, Some(5.0)),
            neighbors(3.0, Some(4.0)),
            neighbors(7.0, None),
        ];
        let kept = ratio_filter(&queries, 0.75).unwrap();
        assert_eq!(
            kept,
            vec![
                Some(RatioMatch {
                    neighbor: 3,
                    ratio: 0.5
                }),
                None,
                Some(RatioMatch {
                    neighbor: 3,
                    ratio: 0.75
                }),
                Some(RatioMatch {
                    neighbor: 3,
                    ratio: 0.0
                }),
            ]
        );
    }

    #[test]
    fn filter_propagates_invariant_errors() {
        let queries = [neighbors(1.0, Some(2.0)), neighbors(1.0, Some(0.0))];
        assert!(matches!(
            ratio_filter(&queries, 0.8),
            Err(Error::DataInvariant(_))
        ));
    }
}
