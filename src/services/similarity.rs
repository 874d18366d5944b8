use std::sync::Arc;

use thiserror::Error;

use super::rating_matrix::{RatingMatrix, SparseRow};

/// Error types for the similarity index
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("Similarity index has no rows")]
    NotFound,
}

/// A single nearest-neighbor hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    /// Cosine distance, 0.0 for identical direction, 1.0 for no overlap
    pub distance: f64,
}

/// Brute-force cosine nearest-neighbor index over matrix rows
///
/// Keeps an inverted user -> (row, rating) posting list so a query only touches
/// rows that share at least one user with the query vector. Immutable once
/// built and safe to query from many requests at once.
#[derive(Debug)]
pub struct SimilarityIndex {
    matrix: Arc<RatingMatrix>,
    norms: Vec<f64>,
    postings: Vec<Vec<(usize, f32)>>,
}

impl SimilarityIndex {
    pub fn build(matrix: Arc<RatingMatrix>) -> Self {
        let norms = matrix.rows().iter().map(SparseRow::norm).collect();

        let mut postings = vec![Vec::new(); matrix.user_count()];
        for (row, ratings) in matrix.rows().iter().enumerate() {
            for (column, value) in ratings.iter() {
                postings[column].push((row, value));
            }
        }

        Self {
            matrix,
            norms,
            postings,
        }
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Returns the `k` rows closest to `vector`, nearest first
    ///
    /// Ties are broken by ascending row index. If `vector` is itself one of the
    /// indexed rows it is part of the result at distance 0.
    pub fn query(&self, vector: &SparseRow, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.is_empty() {
            return Err(IndexError::NotFound);
        }

        let mut dots = vec![0.0_f64; self.len()];
        for (column, value) in vector.iter() {
            let Some(posting) = self.postings.get(column) else {
                continue;
            };
            for (row, rating) in posting {
                dots[*row] += f64::from(value) * f64::from(*rating);
            }
        }

        let query_norm = vector.norm();
        let mut neighbors: Vec<Neighbor> = dots
            .into_iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(row, (dot, norm))| Neighbor {
                row,
                distance: cosine_distance(dot, query_norm, *norm),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Nearest neighbors of an indexed row, by row index
    pub fn query_row(&self, row: usize, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        let vector = self.matrix.row(row).ok_or(IndexError::NotFound)?;
        self.query(vector, k)
    }
}

/// 1 - cos(a, b); zero-norm vectors are treated as orthogonal to everything
fn cosine_distance(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    (1.0 - similarity).clamp(0.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    fn index(ratings: &[Rating]) -> SimilarityIndex {
        SimilarityIndex::build(Arc::new(RatingMatrix::build(ratings)))
    }

    /// Items 1..=3, with 2 and 3 nearly identical and 1 pointing elsewhere
    fn sample() -> SimilarityIndex {
        index(&[
            Rating::new(1, 1, 5.0),
            Rating::new(2, 1, 1.0),
            Rating::new(3, 2, 4.0),
            Rating::new(4, 2, 5.0),
            Rating::new(3, 3, 4.0),
            Rating::new(4, 3, 4.0),
        ])
    }

    #[test]
    fn test_query_orders_by_distance() {
        let index = sample();
        let neighbors = index.query_row(1, 3).unwrap();
        let rows: Vec<usize> = neighbors.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![1, 2, 0]);
        assert!(neighbors[0].distance.abs() < 1e-9);
        assert!(neighbors[1].distance < 0.01);
        assert!((neighbors[2].distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_query_limits_to_k() {
        let index = sample();
        assert_eq!(index.query_row(0, 2).unwrap().len(), 2);
        assert_eq!(index.query_row(0, 10).unwrap().len(), 3);
        assert!(index.query_row(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_broken_by_row_index() {
        // Rows 0, 1 and 2 are all orthogonal to row 3
        let index = index(&[
            Rating::new(1, 10, 3.0),
            Rating::new(2, 20, 3.0),
            Rating::new(3, 30, 3.0),
            Rating::new(4, 40, 3.0),
        ]);
        let rows: Vec<usize> = index.query_row(3, 4).unwrap().iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_identical_rows_share_zero_distance() {
        let index = index(&[
            Rating::new(1, 1, 2.0),
            Rating::new(1, 2, 4.0),
        ]);
        let neighbors = index.query_row(1, 2).unwrap();
        // Same direction, so both sit at distance 0 and row 0 sorts first
        assert_eq!(neighbors[0].row, 0);
        assert_eq!(neighbors[1].row, 1);
        assert!(neighbors.iter().all(|n| n.distance.abs() < 1e-9));
    }

    #[test]
    fn test_query_is_idempotent() {
        let index = sample();
        let vector = index.matrix().row(2).unwrap().clone();
        let first = index.query(&vector, 3).unwrap();
        let second = index.query(&vector, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_vector_is_orthogonal() {
        let index = sample();
        let neighbors = index.query(&SparseRow::default(), 3).unwrap();
        assert!(neighbors.iter().all(|n| n.distance == 1.0));
        assert_eq!(neighbors.iter().map(|n| n.row).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_index_is_not_found() {
        let index = index(&[]);
        assert!(index.is_empty());
        assert_eq!(index.query(&SparseRow::default(), 5), Err(IndexError::NotFound));
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert_eq!(cosine_distance(0.0, 0.0, 1.0), 1.0);
        assert_eq!(cosine_distance(4.0, 2.0, 2.0), 0.0);
        assert_eq!(cosine_distance(-4.0, 2.0, 2.0), 2.0);
    }
}
