use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::RecommendationEngine;

/// Shared application state
///
/// The engine sits behind a single `RwLock`: mutations (including the
/// similarity recompute they may trigger) hold the write lock, so readers
/// never observe a half-rebuilt matrix.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<RecommendationEngine>>,
    /// File used by the save/load model endpoints
    pub model_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, model_path: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            model_path: Arc::new(model_path.into()),
        }
    }
}
