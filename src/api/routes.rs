use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Learning signals
        .route("/record-action/", post(handlers::record_action))
        .route("/add-email-features/", post(handlers::add_email_features))
        // Recommendations
        .route("/recommendations/", post(handlers::get_recommendations))
        .route("/rebuild-similarity/", post(handlers::rebuild_similarity))
        // Model persistence
        .route("/save-recommendation-model/", post(handlers::save_model))
        .route("/load-recommendation-model/", post(handlers::load_model))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
