use crate::DistanceMatrix;
use log::*;
use ndarray::ArrayView1;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Which set is queried against which.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Each descriptor of A (a row) looks for its neighbors in B.
    AtoB,
    /// Each descriptor of B (a column) looks for its neighbors in A.
    BtoA,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::AtoB => Direction::BtoA,
            Direction::BtoA => Direction::AtoB,
        }
    }
}

/// A candidate from the other set and its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// The two closest candidates of one query descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors {
    pub first: Neighbor,
    /// Always has a different index than `first`, but may have the same distance.
    /// `None` when the other set only has one descriptor.
    pub second: Option<Neighbor>,
}

impl Neighbors {
    /// The second nearest distance, or infinity when there is no second neighbor.
    pub fn second_distance(&self) -> f32 {
        self.second.map_or(f32::INFINITY, |n| n.distance)
    }
}

/// Finds the first and second nearest neighbors of every query in `direction`.
///
/// Ties always resolve to the candidate with the lowest index, so results don't
/// depend on evaluation order. The result has one entry per query descriptor,
/// or is empty when the candidate set is empty.
pub fn nearest_neighbors(matrix: &DistanceMatrix, direction: Direction) -> Vec<Neighbors> {
    let view = match direction {
        Direction::AtoB => matrix.view(),
        Direction::BtoA => matrix.transposed_view(),
    };
    let neighbors: Vec<Neighbors> = view
        .rows()
        .into_iter()
        .filter_map(two_nearest)
        .collect();
    trace!(
        "Extracted {} nearest neighbors in direction {:?}.",
        neighbors.len(),
        direction
    );
    neighbors
}

/// Only the index of the nearest neighbor of each query.
pub fn nearest_indices(matrix: &DistanceMatrix, direction: Direction) -> Vec<usize> {
    nearest_neighbors(matrix, direction)
        .iter()
        .map(|n| n.first.index)
        .collect()
}

fn two_nearest(distances: ArrayView1<f32>) -> Option<Neighbors> {
    let mut candidates = distances
        .iter()
        .enumerate()
        .map(|(index, &distance)| Neighbor { index, distance });
    let mut neighbors = Neighbors {
        first: candidates.next()?,
        second: None,
    };
    // Strict comparisons keep the earliest index among equal distances.
    for candidate in candidates {
        if candidate.distance < neighbors.first.distance {
            neighbors.second = Some(neighbors.first);
            neighbors.first = candidate;
        } else if candidate.distance < neighbors.second_distance() {
            neighbors.second = Some(candidate);
        }
    }
    Some(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn matrix(a: Array2<f32>, b: Array2<f32>) -> DistanceMatrix {
        DistanceMatrix::new(&a, &b).unwrap()
    }

    #[test]
    fn ties_pick_lowest_index() {
        let m = matrix(array![[0.0f32]], array![[3.0f32], [-1.0], [1.0], [-3.0]]);
        let neighbors = nearest_neighbors(&m, Direction::AtoB);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].first, Neighbor { index: 1, distance: 1.0 });
        assert_eq!(neighbors[0].second, Some(Neighbor { index: 2, distance: 1.0 }));
    }

    #[test]
    fn second_neighbor_differs_from_first() {
        let m = matrix(array![[0.0f32]], array![[5.0f32], [2.0], [9.0], [3.0]]);
        let n = nearest_neighbors(&m, Direction::AtoB)[0];
        assert_eq!(n.first.index, 1);
        assert_eq!(n.second.map(|s| s.index), Some(3));
        assert_eq!(n.second_distance(), 3.0);
    }

    #[test]
    fn single_candidate_has_no_second() {
        let m = matrix(array![[0.0f32], [4.0]], array![[1.0f32]]);
        let neighbors = nearest_neighbors(&m, Direction::AtoB);
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.second.is_none()));
        assert_eq!(neighbors[1].second_distance(), f32::INFINITY);
    }

    #[test]
    fn columns_query_b_against_a() {
        let m = matrix(array![[0.0f32], [10.0], [4.0]], array![[9.0f32], [1.0]]);
        assert_eq!(nearest_indices(&m, Direction::AtoB), vec![1, 0, 1]);
        assert_eq!(nearest_indices(&m, Direction::BtoA), vec![1, 0]);
    }

    #[test]
    fn empty_candidates() {
        let m = matrix(array![[0.0f32], [1.0]], Array2::zeros((0, 1)));
        assert!(nearest_neighbors(&m, Direction::AtoB).is_empty());
        assert!(nearest_neighbors(&m, Direction::BtoA).is_empty());
    }
}
