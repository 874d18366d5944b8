use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use super::popularity::PopularityRanker;
use super::rating_matrix::RatingMatrix;
use super::similarity::{IndexError, SimilarityIndex};
use crate::models::{Item, ItemId, Rating, SeedId};

/// Fewer seeds than this fall back to the popularity ranking
pub const MIN_SEED_COUNT: usize = 3;

/// Neighbors collected per seed, independent of the requested result size
pub const NEIGHBORS_PER_SEED: usize = 10;

/// Items need this many ratings to be ranked by popularity
pub const MIN_RATING_COUNT: usize = 50;

/// Error types for the recommendation engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Rating data unavailable: no rated items were loaded")]
    DataUnavailable,
    #[error("Recommendation count must be positive")]
    InvalidLimit,
}

impl From<IndexError> for EngineError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotFound => EngineError::DataUnavailable,
        }
    }
}

/// Outcome of mapping one seed to a matrix row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedResolution {
    Found { item_id: ItemId, row: usize },
    NotFound,
}

/// Immutable recommendation engine built once at startup
///
/// Holds the catalog, the rating matrix with its similarity index and the
/// cached popularity ranking. Shared across requests behind an `Arc`.
#[derive(Debug)]
pub struct RecommendationEngine {
    catalog: Vec<Item>,
    catalog_positions: HashMap<ItemId, usize>,
    index: SimilarityIndex,
    popularity: PopularityRanker,
}

impl RecommendationEngine {
    /// Builds every derived structure from the catalog and rating records
    ///
    /// Catalog order is kept as given. Later duplicates of a catalog
    /// identifier are ignored.
    pub fn build(catalog: Vec<Item>, ratings: &[Rating]) -> Self {
        let mut items = Vec::with_capacity(catalog.len());
        let mut catalog_positions = HashMap::with_capacity(catalog.len());
        for item in catalog {
            if catalog_positions.contains_key(&item.id) {
                tracing::warn!(item_id = item.id, "Duplicate catalog entry ignored");
                continue;
            }
            catalog_positions.insert(item.id, items.len());
            items.push(item);
        }

        let matrix = Arc::new(RatingMatrix::build(ratings));
        let index = SimilarityIndex::build(matrix);
        let popularity = PopularityRanker::build(ratings);

        tracing::info!(
            catalog_items = items.len(),
            ratings = ratings.len(),
            rows = index.len(),
            users = index.matrix().user_count(),
            nonzero = index.matrix().nnz(),
            "Recommendation engine built"
        );

        Self {
            catalog: items,
            catalog_positions,
            index,
            popularity,
        }
    }

    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.catalog_positions
            .get(&item_id)
            .map(|position| &self.catalog[*position])
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// First `limit` catalog items in catalog order
    pub fn list_catalog_items(&self, limit: usize) -> &[Item] {
        &self.catalog[..limit.min(self.catalog.len())]
    }

    /// Best mean-rated items among those rated at least `min_rating_count` times
    ///
    /// Items without a catalog entry are skipped before truncating to `n`.
    pub fn top_rated(&self, n: usize, min_rating_count: usize) -> Vec<Item> {
        self.popularity
            .ranked(min_rating_count)
            .filter_map(|stats| self.item(stats.item_id))
            .take(n)
            .cloned()
            .collect()
    }

    /// Maps a seed to its matrix row
    pub fn resolve_seed(&self, seed: &SeedId) -> SeedResolution {
        match seed
            .item_id()
            .and_then(|item_id| self.index.matrix().row_of(item_id).map(|row| (item_id, row)))
        {
            Some((item_id, row)) => SeedResolution::Found { item_id, row },
            None => SeedResolution::NotFound,
        }
    }

    /// Recommends up to `n` items for the given liked items
    ///
    /// With fewer than [`MIN_SEED_COUNT`] seeds this is exactly
    /// `top_rated(n, MIN_RATING_COUNT)`. The check counts the seeds as given,
    /// unresolvable ones included. Otherwise each seed's nearest neighbors are
    /// appended in seed order, deduplicated keeping the first occurrence, and
    /// truncated to `n`. Seed items never appear in the result.
    pub fn recommend(&self, seeds: &[SeedId], n: usize) -> Result<Vec<Item>, EngineError> {
        if n == 0 {
            return Err(EngineError::InvalidLimit);
        }

        if seeds.len() < MIN_SEED_COUNT {
            tracing::debug!(
                seed_count = seeds.len(),
                "Too few seeds, using popularity ranking"
            );
            return Ok(self.top_rated(n, MIN_RATING_COUNT));
        }

        if self.index.is_empty() {
            return Err(EngineError::DataUnavailable);
        }

        let resolved: Vec<(ItemId, usize)> = seeds
            .iter()
            .filter_map(|seed| match self.resolve_seed(seed) {
                SeedResolution::Found { item_id, row } => Some((item_id, row)),
                SeedResolution::NotFound => {
                    tracing::debug!(seed = %seed, "Seed has no ratings, skipping");
                    None
                }
            })
            .collect();

        let seed_items: HashSet<ItemId> = resolved.iter().map(|(item_id, _)| *item_id).collect();
        let mut seen: HashSet<ItemId> = HashSet::new();
        let mut recommendations = Vec::with_capacity(n);

        'seeds: for (_, row) in &resolved {
            // One extra slot since the seed's own row comes back as well
            let neighbors = self.index.query_row(*row, NEIGHBORS_PER_SEED + 1)?;
            let candidates = neighbors
                .into_iter()
                .filter(|neighbor| neighbor.row != *row)
                .take(NEIGHBORS_PER_SEED)
                .filter_map(|neighbor| self.index.matrix().item_at(neighbor.row));

            for item_id in candidates {
                if seed_items.contains(&item_id) || !seen.insert(item_id) {
                    continue;
                }
                if let Some(item) = self.item(item_id) {
                    recommendations.push(item.clone());
                    if recommendations.len() == n {
                        break 'seeds;
                    }
                }
            }
        }

        tracing::debug!(
            seed_count = seeds.len(),
            resolved = resolved.len(),
            returned = recommendations.len(),
            "Similarity recommendations computed"
        );

        Ok(recommendations)
    }
}
