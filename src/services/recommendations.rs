use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{AppError, AppResult},
    models::{EmailId, Recommendation, UserId},
    services::engine::EngineState,
};

/// Neighbors must be strictly more similar than this to contribute
pub const SIMILARITY_THRESHOLD: f64 = 0.1;

/// Share of the blended score taken from collaborative filtering
pub const COLLABORATIVE_WEIGHT: f64 = 0.6;

/// Share of the blended score taken from content-based filtering
pub const CONTENT_WEIGHT: f64 = 0.4;

const SIMILAR_USERS_REASON: &str = "Users with similar preferences liked this";
const FALLBACK_REASON: &str = "Recommended for you";

/// Builds the ranked recommendation list for `user_id`
///
/// Blends collaborative filtering (what similar users interacted with) and
/// content-based filtering (category preferences learned from the user's own
/// actions). Emails the user already acted on are never returned.
///
/// Ranking is by blended score descending, with ties broken by ascending
/// email id.
pub fn compose(
    state: &EngineState,
    user_id: UserId,
    num_recommendations: usize,
) -> AppResult<Vec<Recommendation>> {
    if num_recommendations == 0 {
        return Ok(Vec::new());
    }

    // 1. Candidates from each strategy, each already cut to the requested size
    let collaborative = collaborative_scores(state, user_id, num_recommendations)?;
    let content = content_scores(state, user_id, num_recommendations)?;

    // 2. Weighted blend; an email may come from one source only
    let mut blended: BTreeMap<EmailId, f64> = BTreeMap::new();
    for (email_id, score) in collaborative {
        *blended.entry(email_id).or_insert(0.0) += score * COLLABORATIVE_WEIGHT;
    }
    for (email_id, score) in content {
        *blended.entry(email_id).or_insert(0.0) += score * CONTENT_WEIGHT;
    }

    // 3. Rank and explain
    let ranked = rank(blended, num_recommendations)?;
    let has_similar_users = has_similar_users(state, user_id);

    Ok(ranked
        .into_iter()
        .map(|(email_id, score)| Recommendation {
            email_id,
            score,
            reason: recommendation_reason(state, email_id, has_similar_users),
        })
        .collect())
}

/// Collaborative filtering scores for emails `user_id` has not seen
///
/// score[email] = Σ similarity(user, neighbor) × action.score over every
/// neighbor above the threshold and every action that neighbor recorded.
pub fn collaborative_scores(
    state: &EngineState,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<(EmailId, f64)>> {
    let Some(neighbors) = state.user_similarity.neighbors(&user_id) else {
        return Ok(Vec::new());
    };

    let seen = seen_emails(state, user_id);
    let mut scores: BTreeMap<EmailId, f64> = BTreeMap::new();

    for (neighbor_id, similarity) in neighbors {
        if !similarity.is_finite() {
            return Err(AppError::Composition(format!(
                "Non-finite similarity between users {} and {}",
                user_id, neighbor_id
            )));
        }

        if *similarity <= SIMILARITY_THRESHOLD {
            continue;
        }

        for action in state.actions_for(*neighbor_id) {
            if seen.contains(&action.email_id) {
                continue;
            }
            *scores.entry(action.email_id).or_insert(0.0) += similarity * action.score;
        }
    }

    rank(scores, limit)
}

/// Content-based scores for emails `user_id` has not seen
///
/// The user's preference for a category is the sum of the scores of their
/// actions on emails in that category. An unseen email scores the sum of the
/// preferences of its categories; only positive scores are candidates.
pub fn content_scores(
    state: &EngineState,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<(EmailId, f64)>> {
    let actions = state.actions_for(user_id);
    if actions.is_empty() {
        return Ok(Vec::new());
    }

    let mut preferences: BTreeMap<&str, f64> = BTreeMap::new();
    for action in actions {
        if let Some(features) = state.email_features.get(&action.email_id) {
            for category in &features.categories {
                *preferences.entry(category.as_str()).or_insert(0.0) += action.score;
            }
        }
    }

    let seen = seen_emails(state, user_id);
    let scores: BTreeMap<EmailId, f64> = state
        .email_features
        .iter()
        .filter(|(email_id, _)| !seen.contains(*email_id))
        .map(|(email_id, features)| {
            let score: f64 = features
                .categories
                .iter()
                .map(|category| preferences.get(category.as_str()).copied().unwrap_or(0.0))
                .sum();
            (*email_id, score)
        })
        .filter(|(_, score)| *score > 0.0)
        .collect();

    rank(scores, limit)
}

/// Sorts by score descending then email id ascending and keeps `limit`
fn rank(
    scores: impl IntoIterator<Item = (EmailId, f64)>,
    limit: usize,
) -> AppResult<Vec<(EmailId, f64)>> {
    let mut ranked: Vec<(EmailId, f64)> = scores.into_iter().collect();

    if let Some((email_id, _)) = ranked.iter().find(|(_, score)| !score.is_finite()) {
        return Err(AppError::Composition(format!(
            "Non-finite score for email {}",
            email_id
        )));
    }

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(limit);
    Ok(ranked)
}

fn seen_emails(state: &EngineState, user_id: UserId) -> BTreeSet<EmailId> {
    state
        .actions_for(user_id)
        .iter()
        .map(|action| action.email_id)
        .collect()
}

fn has_similar_users(state: &EngineState, user_id: UserId) -> bool {
    state
        .user_similarity
        .neighbors(&user_id)
        .is_some_and(|neighbors| neighbors.values().any(|s| *s > SIMILARITY_THRESHOLD))
}

fn recommendation_reason(state: &EngineState, email_id: EmailId, has_similar_users: bool) -> String {
    let mut reasons = Vec::new();

    if has_similar_users {
        reasons.push(SIMILAR_USERS_REASON.to_string());
    }

    if let Some(features) = state.email_features.get(&email_id) {
        if !features.categories.is_empty() {
            let interests: Vec<&str> = features
                .categories
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();
            reasons.push(format!(
                "Related to your interests in {}",
                interests.join(", ")
            ));
        }
    }

    if reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        reasons.join("; ")
    }
}
