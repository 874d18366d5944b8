use std::sync::Arc;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::services::RecommendationEngine;

/// Shared application state
///
/// The engine is built once before serving and only read afterwards, so
/// handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub catalog_limit: usize,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, catalog_limit: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            catalog_limit,
        }
    }

    /// Builds the engine from a loaded dataset
    pub fn from_dataset(dataset: Dataset, config: &Config) -> Self {
        let engine = RecommendationEngine::build(dataset.catalog, &dataset.ratings);
        Self::new(engine, config.catalog_limit)
    }
}
