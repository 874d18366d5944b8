pub mod popularity;
pub mod rating_matrix;
pub mod recommendations;
pub mod similarity;

pub use recommendations::{EngineError, RecommendationEngine};
