use crate::ratio::{validate_threshold, DEFAULT_RATIO_THRESHOLD};
use crate::{DistanceMatrix, Error, Matches, Result};
use core::fmt;
use core::str::FromStr;
use log::*;
use ndarray::ArrayView2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The matching strategies, from least to most selective.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Nearest neighbor.
    Nn,
    /// Nearest neighbor with the first to second neighbor ratio test.
    Snn,
    /// Mutual nearest neighbor.
    #[default]
    Mnn,
    /// Mutual nearest neighbor with the ratio test in both directions.
    Smnn,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::Nn, Strategy::Snn, Strategy::Mnn, Strategy::Smnn];

    /// Whether scores are distance ratios rather than distances.
    pub fn scores_are_ratios(self) -> bool {
        matches!(self, Strategy::Snn | Strategy::Smnn)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Nn => "nn",
            Strategy::Snn => "snn",
            Strategy::Mnn => "mnn",
            Strategy::Smnn => "smnn",
        })
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter {
                name: "strategy",
                reason: format!("unknown strategy {s:?}, expected one of nn, snn, mnn, smnn"),
            })
    }
}

/// Matches descriptor sets with a configured ratio threshold.
///
/// The threshold only affects [`Strategy::Snn`] and [`Strategy::Smnn`]. It must
/// lie in `(0, 1]`, which is checked every time matching runs.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matcher {
    /// Maximum allowed ratio between the first and second nearest distances
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_ratio_threshold")
    )]
    pub ratio_threshold: f32,
}

impl Matcher {
    pub fn new(ratio_threshold: f32) -> Self {
        Self { ratio_threshold }
    }

    /// Only keeps clearly distinctive matches.
    ///
    /// Uses a threshold of `0.6` (default is `0.8`).
    pub fn strict() -> Self {
        Self::new(0.6)
    }

    /// Keeps more ambiguous matches.
    ///
    /// Uses a threshold of `0.9` (default is `0.8`).
    pub fn loose() -> Self {
        Self::new(0.9)
    }

    /// Runs `strategy` on descriptor sets `a` and `b`, both `(N, D)` arrays.
    ///
    /// # Example
    /// ```
    /// use cv_matching::{Matcher, Strategy};
    /// use ndarray::array;
    /// let a = array![[0.0f32, 0.0], [5.0, 5.0]];
    /// let b = array![[0.0f32, 0.0], [5.0, 5.0], [10.0, 10.0]];
    /// let matches = Matcher::default().run(Strategy::Mnn, &a, &b).unwrap();
    /// assert_eq!(matches.pairs(), &[[0, 0], [1, 1]]);
    /// ```
    pub fn run<'a, 'b>(
        &self,
        strategy: Strategy,
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Matches> {
        if strategy.scores_are_ratios() {
            validate_threshold(self.ratio_threshold)?;
        }
        let matrix = DistanceMatrix::new(a, b)?;
        let matches = self.run_on(strategy, &matrix)?;
        info!(
            "Matched {} of {}x{} descriptors with {}",
            matches.len(),
            matrix.len_a(),
            matrix.len_b(),
            strategy
        );
        Ok(matches)
    }

    /// Runs `strategy` on an already computed distance matrix.
    pub fn run_on(&self, strategy: Strategy, matrix: &DistanceMatrix) -> Result<Matches> {
        match strategy {
            Strategy::Nn => Ok(matrix.nn()),
            Strategy::Snn => matrix.snn(self.ratio_threshold),
            Strategy::Mnn => Ok(matrix.mnn()),
            Strategy::Smnn => matrix.smnn(self.ratio_threshold),
        }
    }

    pub fn nn<'a, 'b>(
        &self,
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Matches> {
        self.run(Strategy::Nn, a, b)
    }

    pub fn snn<'a, 'b>(
        &self,
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Matches> {
        self.run(Strategy::Snn, a, b)
    }

    pub fn mnn<'a, 'b>(
        &self,
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Matches> {
        self.run(Strategy::Mnn, a, b)
    }

    pub fn smnn<'a, 'b>(
        &self,
        a: impl Into<ArrayView2<'a, f32>>,
        b: impl Into<ArrayView2<'b, f32>>,
    ) -> Result<Matches> {
        self.run(Strategy::Smnn, a, b)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(default_ratio_threshold())
    }
}

fn default_ratio_threshold() -> f32 {
    DEFAULT_RATIO_THRESHOLD
}
