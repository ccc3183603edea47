use crate::mutual::mutual_filter;
use crate::neighbors::{nearest_indices, nearest_neighbors, Direction};
use crate::ratio::{ratio_filter, validate_threshold, RatioMatch};
use crate::{DistanceMatrix, Result};
use derive_more::Constructor;
use float_ord::FloatOrd;
use log::*;
use ndarray::{Array1, Array2, Axis};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Descriptor `a` of set A matched to descriptor `b` of set B.
///
/// The score is a distance or a ratio depending on the strategy that made the match.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
pub struct DescriptorMatch {
    pub a: usize,
    pub b: usize,
    pub score: f32,
}

/// The result of matching two descriptor sets.
///
/// Matches are sorted by ascending score. Equal scores are ordered by the index in A.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matches {
    pairs: Vec<[usize; 2]>,
    scores: Vec<f32>,
}

impl Matches {
    fn assemble(candidates: impl IntoIterator<Item = DescriptorMatch>) -> Self {
        let mut candidates: Vec<DescriptorMatch> = candidates.into_iter().collect();
        candidates.sort_by_key(|m| (FloatOrd(m.score), m.a));
        let (pairs, scores) = candidates.into_iter().map(|m| ([m.a, m.b], m.score)).unzip();
        Self { pairs, scores }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `[index in A, index in B]` for every match.
    pub fn pairs(&self) -> &[[usize; 2]] {
        &self.pairs
    }

    /// One score per pair.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = DescriptorMatch> + '_ {
        self.pairs
            .iter()
            .zip(&self.scores)
            .map(|(&[a, b], &score)| DescriptorMatch::new(a, b, score))
    }

    /// The same matches seen from set B, re-sorted so ties order by the index in B.
    pub fn swapped(&self) -> Self {
        Self::assemble(self.iter().map(|m| DescriptorMatch::new(m.b, m.a, m.score)))
    }

    /// Index pairs as an `(M, 2)` array and scores as an `(M, 1)` array.
    pub fn into_arrays(self) -> (Array2<usize>, Array2<f32>) {
        let pairs = Array2::from_shape_fn((self.len(), 2), |(row, col)| self.pairs[row][col]);
        (pairs, Array1::from(self.scores).insert_axis(Axis(1)))
    }
}

/// Each strategy reuses the one matrix, so several strategies can share a single
/// distance computation.
impl DistanceMatrix {
    /// Nearest neighbor in B of every descriptor in A, scored by distance.
    pub fn nn(&self) -> Matches {
        let matches = Matches::assemble(
            nearest_neighbors(self, Direction::AtoB)
                .into_iter()
                .enumerate()
                .map(|(a, n)| DescriptorMatch::new(a, n.first.index, n.first.distance)),
        );
        debug!("NN kept {} of {} descriptors", matches.len(), self.len_a());
        matches
    }

    /// Nearest neighbors that pass the ratio test, scored by ratio.
    pub fn snn(&self, threshold: f32) -> Result<Matches> {
        let forward = ratio_filter(&nearest_neighbors(self, Direction::AtoB), threshold)?;
        let matches = Matches::assemble(forward.into_iter().enumerate().filter_map(|(a, m)| {
            m.map(|RatioMatch { neighbor, ratio }| DescriptorMatch::new(a, neighbor, ratio))
        }));
        debug!(
            "SNN kept {} of {} descriptors with threshold {}",
            matches.len(),
            self.len_a(),
            threshold
        );
        Ok(matches)
    }

    /// Pairs that are each other's nearest neighbor, scored by distance.
    pub fn mnn(&self) -> Matches {
        let forward = self.first_neighbors(Direction::AtoB);
        let reverse = self.first_neighbors(Direction::BtoA);
        let distances = self.view();
        let matches = Matches::assemble(
            mutual_filter(&forward, &reverse)
                .map(|(a, b)| DescriptorMatch::new(a, b, distances[(a, b)])),
        );
        debug!(
            "MNN kept {} mutual pairs out of {} and {} descriptors",
            matches.len(),
            self.len_a(),
            self.len_b()
        );
        matches
    }

    /// Mutual nearest neighbors that pass the ratio test in both directions.
    ///
    /// The score is the larger of the two directional ratios.
    pub fn smnn(&self, threshold: f32) -> Result<Matches> {
        let threshold = validate_threshold(threshold)?;
        let forward = ratio_filter(&nearest_neighbors(self, Direction::AtoB), threshold)?;
        let reverse = ratio_filter(&nearest_neighbors(self, Direction::BtoA), threshold)?;
        let forward_map: Vec<Option<usize>> =
            forward.iter().map(|m| m.map(|m| m.neighbor)).collect();
        let reverse_map: Vec<Option<usize>> =
            reverse.iter().map(|m| m.map(|m| m.neighbor)).collect();
        let ratio = |m: Option<RatioMatch>| m.map_or(f32::INFINITY, |m| m.ratio);
        let matches = Matches::assemble(
            mutual_filter(&forward_map, &reverse_map).map(|(a, b)| {
                DescriptorMatch::new(a, b, ratio(forward[a]).max(ratio(reverse[b])))
            }),
        );
        debug!(
            "SMNN kept {} mutual pairs with threshold {}",
            matches.len(),
            threshold
        );
        Ok(matches)
    }

    fn first_neighbors(&self, direction: Direction) -> Vec<Option<usize>> {
        nearest_indices(self, direction)
            .into_iter()
            .map(Some)
            .collect()
    }
}
