use serde::{Deserialize, Serialize};

use super::{EmailId, UserId};

/// A single scored recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub email_id: EmailId,
    pub score: f64,
    /// Human-readable justification
    pub reason: String,
}

/// Request for a user's recommended emails
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,
}

fn default_num_recommendations() -> usize {
    5
}

/// Response with the ranked recommendation list
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub user_id: UserId,
    pub total_recommendations: usize,
}

impl RecommendationResponse {
    pub fn new(user_id: UserId, recommendations: Vec<Recommendation>) -> Self {
        Self {
            total_recommendations: recommendations.len(),
            recommendations,
            user_id,
        }
    }
}
