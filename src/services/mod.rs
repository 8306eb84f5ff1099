pub mod engine;
pub mod persistence;
pub mod recommendations;
pub mod similarity;
pub mod tfidf;

pub use engine::{EngineState, EngineStats, RecommendationEngine};
pub use persistence::PersistenceOutcome;
pub use similarity::SimilarityMatrix;
