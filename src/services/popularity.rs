use std::collections::BTreeMap;

use crate::models::{ItemId, Rating};

/// Mean rating and rating count for a single item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemStats {
    pub item_id: ItemId,
    pub mean: f64,
    pub count: usize,
}

/// Mean-rating ranking used when there are too few seeds for similarity search
///
/// Aggregates are computed once over every raw rating record and reused for
/// each call; the dataset never changes after startup.
#[derive(Debug, Clone, Default)]
pub struct PopularityRanker {
    /// Sorted by mean descending, then item identifier ascending
    ranked: Vec<ItemStats>,
}

impl PopularityRanker {
    pub fn build(ratings: &[Rating]) -> Self {
        let mut totals: BTreeMap<ItemId, (f64, usize)> = BTreeMap::new();
        for rating in ratings {
            let entry = totals.entry(rating.item_id).or_insert((0.0, 0));
            entry.0 += f64::from(rating.value);
            entry.1 += 1;
        }

        let mut ranked: Vec<ItemStats> = totals
            .into_iter()
            .map(|(item_id, (sum, count))| ItemStats {
                item_id,
                mean: sum / count as f64,
                count,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        Self { ranked }
    }

    /// Items with at least `min_rating_count` ratings, best mean first
    pub fn ranked(&self, min_rating_count: usize) -> impl Iterator<Item = &ItemStats> + '_ {
        self.ranked
            .iter()
            .filter(move |stats| stats.count >= min_rating_count)
    }
}
