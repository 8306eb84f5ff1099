use axum::{extract::State, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        EmailFeatureRequest, MessageResponse, RecommendationRequest, RecommendationResponse,
        UserActionRequest,
    },
    services::{EngineStats, PersistenceOutcome},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engine: EngineStats,
}

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Email Recommendation Service",
        "status": "healthy"
    }))
}

/// Detailed health check with engine counters
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine.read().await;
    Json(HealthResponse {
        status: "healthy",
        engine: engine.stats(),
    })
}

/// Record a user action for recommendation learning
///
/// Runs on the blocking pool because every tenth action of a user rebuilds
/// both similarity matrices.
pub async fn record_action(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<UserActionRequest>,
) -> AppResult<Json<MessageResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        email_id = request.email_id,
        action_type = %request.action_type,
        "Recording action"
    );

    let mut engine = state.engine.clone().write_owned().await;
    tokio::task::spawn_blocking(move || {
        engine.record_action(
            request.user_id,
            request.email_id,
            request.action_type,
            request.metadata,
        );
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(MessageResponse::new("Action recorded successfully")))
}

/// Add email features for content-based recommendations
pub async fn add_email_features(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<EmailFeatureRequest>,
) -> Json<MessageResponse> {
    tracing::info!(
        request_id = %request_id,
        email_id = request.email_id,
        categories = ?request.categories,
        "Adding email features"
    );

    let mut engine = state.engine.write().await;
    engine.add_email_features(
        request.email_id,
        request.subject,
        request.body,
        request.sender,
        request.categories,
    );

    Json(MessageResponse::new("Email features added successfully"))
}

/// Get email recommendations for a user
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> Json<RecommendationResponse> {
    let engine = state.engine.read().await;
    let recommendations = engine.get_recommendations(request.user_id, request.num_recommendations);

    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        requested = request.num_recommendations,
        returned = recommendations.len(),
        "Recommendations served"
    );

    Json(RecommendationResponse::new(request.user_id, recommendations))
}

/// Rebuild both similarity matrices on demand
pub async fn rebuild_similarity(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<MessageResponse>> {
    tracing::info!(request_id = %request_id, "Rebuilding similarity matrices");

    let mut engine = state.engine.clone().write_owned().await;
    tokio::task::spawn_blocking(move || engine.rebuild_similarity())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(MessageResponse::new("Similarity matrices rebuilt")))
}

/// Save the current recommendation model
pub async fn save_model(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<MessageResponse>> {
    let engine = state.engine.read().await;
    let outcome = engine.save_model(state.model_path.as_path());

    tracing::info!(request_id = %request_id, outcome = ?outcome, "Save model requested");

    match outcome {
        PersistenceOutcome::Failed(detail) => Err(AppError::Internal(detail)),
        _ => Ok(Json(MessageResponse::new(
            "Recommendation model saved successfully",
        ))),
    }
}

/// Load the recommendation model, replacing in-memory state
pub async fn load_model(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<MessageResponse>> {
    let mut engine = state.engine.write().await;
    let outcome = engine.load_model(state.model_path.as_path());

    tracing::info!(request_id = %request_id, outcome = ?outcome, "Load model requested");

    match outcome {
        PersistenceOutcome::Failed(detail) => Err(AppError::Internal(detail)),
        PersistenceOutcome::NotFound => Ok(Json(MessageResponse::new(
            "No existing recommendation model found",
        ))),
        _ => Ok(Json(MessageResponse::new(
            "Recommendation model loaded successfully",
        ))),
    }
}
