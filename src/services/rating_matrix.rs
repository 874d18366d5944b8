use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{ItemId, Rating, UserId};

/// Sparse ratings of a single item, keyed by user column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    /// User column indices, strictly ascending
    pub columns: Vec<usize>,
    /// Rating at the matching column
    pub values: Vec<f32>,
}

impl SparseRow {
    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|v| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.columns.iter().copied().zip(self.values.iter().copied())
    }
}

/// Item-by-user rating matrix
///
/// Rows are the distinct items found in the ratings, ordered by ascending item
/// identifier. Columns are the distinct users, likewise ordered by identifier.
/// Cells that were never rated are implicitly zero.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    rows: Vec<SparseRow>,
    row_items: Vec<ItemId>,
    item_rows: HashMap<ItemId, usize>,
    user_count: usize,
    duplicates: usize,
}

impl RatingMatrix {
    /// Builds the matrix from raw rating records
    ///
    /// When the same (user, item) pair appears more than once, the last record
    /// in input order wins. The number of overwritten cells is reported by
    /// [`RatingMatrix::duplicate_count`].
    pub fn build(ratings: &[Rating]) -> Self {
        let row_items: Vec<ItemId> = ratings
            .iter()
            .map(|r| r.item_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_rows: HashMap<ItemId, usize> = row_items
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();

        let user_columns: HashMap<UserId, usize> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(column, id)| (id, column))
            .collect();

        let mut cells: Vec<BTreeMap<usize, f32>> = vec![BTreeMap::new(); row_items.len()];
        let mut duplicates = 0;
        for rating in ratings {
            let row = item_rows[&rating.item_id];
            let column = user_columns[&rating.user_id];
            if cells[row].insert(column, rating.value).is_some() {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                "Duplicate (user, item) ratings found, keeping the last occurrence"
            );
        }

        let rows = cells
            .into_iter()
            .map(|row| {
                let (columns, values) = row.into_iter().filter(|(_, v)| *v != 0.0).unzip();
                SparseRow { columns, values }
            })
            .collect();

        Self {
            rows,
            row_items,
            item_rows,
            user_count: user_columns.len(),
            duplicates,
        }
    }

    /// Row index holding the ratings of `item_id`, if the item was rated at all
    pub fn row_of(&self, item_id: ItemId) -> Option<usize> {
        self.item_rows.get(&item_id).copied()
    }

    /// Item stored at `row`
    pub fn item_at(&self, row: usize) -> Option<ItemId> {
        self.row_items.get(row).copied()
    }

    pub fn row(&self, row: usize) -> Option<&SparseRow> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseRow::nnz).sum()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings() -> Vec<Rating> {
        vec![
            Rating::new(7, 30, 4.0),
            Rating::new(2, 10, 5.0),
            Rating::new(7, 10, 3.0),
            Rating::new(2, 20, 1.0),
        ]
    }

    #[test]
    fn test_rows_follow_sorted_item_ids() {
        let matrix = RatingMatrix::build(&ratings());
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.row_of(10), Some(0));
        assert_eq!(matrix.row_of(20), Some(1));
        assert_eq!(matrix.row_of(30), Some(2));
        assert_eq!(matrix.item_at(2), Some(30));
        assert_eq!(matrix.user_count(), 2);
    }

    #[test]
    fn test_row_holds_user_ratings() {
        let matrix = RatingMatrix::build(&ratings());
        // Users 2 and 7 map to columns 0 and 1
        let row = matrix.row(0).unwrap();
        assert_eq!(row.columns, vec![0, 1]);
        assert_eq!(row.values, vec![5.0, 3.0]);
        assert_eq!(matrix.nnz(), 4);
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut shuffled = ratings();
        shuffled.reverse();
        let a = RatingMatrix::build(&ratings());
        let b = RatingMatrix::build(&shuffled);
        for item in [10, 20, 30] {
            assert_eq!(a.row_of(item), b.row_of(item));
            let row = a.row_of(item).unwrap();
            assert_eq!(a.row(row), b.row(row));
        }
    }

    #[test]
    fn test_unrated_item_has_no_row() {
        let matrix = RatingMatrix::build(&ratings());
        assert_eq!(matrix.row_of(99), None);
        assert_eq!(matrix.item_at(3), None);
    }

    #[test]
    fn test_duplicate_pair_last_occurrence_wins() {
        let matrix = RatingMatrix::build(&[
            Rating::new(1, 5, 2.0),
            Rating::new(1, 5, 4.0),
            Rating::new(1, 5, 3.0),
        ]);
        assert_eq!(matrix.row(0).unwrap().values, vec![3.0]);
        assert_eq!(matrix.duplicate_count(), 2);
    }

    #[test]
    fn test_empty_ratings() {
        let matrix = RatingMatrix::build(&[]);
        assert_eq!(matrix.row_count(), 0);
        assert_eq!(matrix.nnz(), 0);
    }
}
