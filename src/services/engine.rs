use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    models::{
        ActionType, EmailFeatureRecord, EmailId, Metadata, Recommendation, UserActionRecord,
        UserId,
    },
    services::{
        persistence::{self, PersistenceOutcome},
        recommendations,
        similarity::{self, SimilarityMatrix},
    },
};

/// A user's recorded actions trigger a full recompute every this many actions
pub const RECOMPUTE_INTERVAL: usize = 10;

/// Per-user action history in insertion order
pub type ActionStore = BTreeMap<UserId, Vec<UserActionRecord>>;

/// Latest feature record per email
pub type FeatureStore = BTreeMap<EmailId, EmailFeatureRecord>;

/// Everything the engine has learned; saved and restored as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub user_actions: ActionStore,
    #[serde(default)]
    pub email_features: FeatureStore,
    #[serde(default)]
    pub user_similarity: SimilarityMatrix<UserId>,
    #[serde(default)]
    pub item_similarity: SimilarityMatrix<EmailId>,
}

impl EngineState {
    /// Actions recorded for `user_id`, oldest first
    pub fn actions_for(&self, user_id: UserId) -> &[UserActionRecord] {
        self.user_actions
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Counters surfaced by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStats {
    pub users: usize,
    pub actions: usize,
    pub emails: usize,
    pub user_similarity_pairs: usize,
    pub item_similarity_pairs: usize,
    pub recompute_count: u64,
    pub last_recompute: Option<DateTime<Utc>>,
}

/// Email recommendation engine
///
/// Holds the action and feature stores plus the similarity matrices derived
/// from them. Mutators take `&mut self`; callers sharing an engine across
/// tasks must serialize access (the HTTP layer wraps it in a `RwLock`).
#[derive(Debug, Default)]
pub struct RecommendationEngine {
    state: EngineState,
    recompute_count: u64,
    last_recompute: Option<DateTime<Utc>>,
}

impl RecommendationEngine {
    /// Creates an engine with empty stores
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine over previously learned state
    pub fn from_state(state: EngineState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn actions_for(&self, user_id: UserId) -> &[UserActionRecord] {
        self.state.actions_for(user_id)
    }

    pub fn email_features(&self, email_id: EmailId) -> Option<&EmailFeatureRecord> {
        self.state.email_features.get(&email_id)
    }

    pub fn user_similarity(&self) -> &SimilarityMatrix<UserId> {
        &self.state.user_similarity
    }

    pub fn item_similarity(&self) -> &SimilarityMatrix<EmailId> {
        &self.state.item_similarity
    }

    /// Number of similarity recompute cycles run by this instance
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// Records a user action for recommendation learning
    ///
    /// Unknown action types are accepted and weighted 1.0. Every
    /// `RECOMPUTE_INTERVAL`-th action of a user rebuilds the similarity
    /// matrices for all users and emails before returning.
    pub fn record_action(
        &mut self,
        user_id: UserId,
        email_id: EmailId,
        action_type: impl Into<ActionType>,
        metadata: Metadata,
    ) {
        let record = UserActionRecord::new(email_id, action_type.into(), metadata);

        tracing::debug!(
            user_id,
            email_id,
            action_type = %record.action_type,
            score = record.score,
            "Recording user action"
        );

        let actions = self.state.user_actions.entry(user_id).or_default();
        actions.push(record);
        let action_count = actions.len();

        if action_count % RECOMPUTE_INTERVAL == 0 {
            tracing::info!(
                user_id,
                action_count,
                "Action cadence reached, recomputing similarity"
            );
            self.rebuild_similarity();
        }
    }

    /// Adds or replaces the content features of an email
    ///
    /// Does not trigger a recompute.
    pub fn add_email_features(
        &mut self,
        email_id: EmailId,
        subject: String,
        body: String,
        sender: String,
        categories: Vec<String>,
    ) {
        let record = EmailFeatureRecord::new(email_id, subject, body, sender, categories);
        let replaced = self.state.email_features.insert(email_id, record).is_some();

        tracing::debug!(email_id, replaced, "Stored email features");
    }

    /// Recomputes user and item similarity from the current stores
    ///
    /// Each matrix is replaced wholesale. User similarity is left as-is with
    /// fewer than two users; item similarity is left as-is with no features
    /// or when vectorization fails.
    pub fn rebuild_similarity(&mut self) {
        if let Some(matrix) = similarity::compute_user_similarity(&self.state.user_actions) {
            self.state.user_similarity = matrix;
        }

        match similarity::compute_item_similarity(&self.state.email_features) {
            Ok(Some(matrix)) => self.state.item_similarity = matrix,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Error updating item similarity");
            }
        }

        self.recompute_count += 1;
        self.last_recompute = Some(Utc::now());

        tracing::info!(
            recompute_count = self.recompute_count,
            user_pairs = self.state.user_similarity.pair_count(),
            item_pairs = self.state.item_similarity.pair_count(),
            "Similarity matrices updated"
        );
    }

    /// Returns up to `num_recommendations` emails for `user_id`
    ///
    /// Never fails: any composition error is logged and yields an empty list.
    pub fn get_recommendations(
        &self,
        user_id: UserId,
        num_recommendations: usize,
    ) -> Vec<Recommendation> {
        match recommendations::compose(&self.state, user_id, num_recommendations) {
            Ok(recs) => {
                tracing::debug!(user_id, count = recs.len(), "Recommendations composed");
                recs
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Error getting recommendations");
                Vec::new()
            }
        }
    }

    /// Writes the full engine state to `path`
    pub fn save_model(&self, path: impl AsRef<Path>) -> PersistenceOutcome {
        let path = path.as_ref();
        match persistence::write_state(path, &self.state) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Recommendation model saved");
                PersistenceOutcome::Saved
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error saving model");
                PersistenceOutcome::Failed(e.to_string())
            }
        }
    }

    /// Replaces the engine state with the one stored at `path`
    ///
    /// A missing file or unreadable content leaves the current state intact.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> PersistenceOutcome {
        let path = path.as_ref();
        match persistence::read_state(path) {
            Ok(Some(state)) => {
                self.state = state;
                tracing::info!(
                    path = %path.display(),
                    users = self.state.user_actions.len(),
                    emails = self.state.email_features.len(),
                    "Recommendation model loaded"
                );
                PersistenceOutcome::Loaded
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No existing recommendation model found");
                PersistenceOutcome::NotFound
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error loading model");
                PersistenceOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            users: self.state.user_actions.len(),
            actions: self.state.user_actions.values().map(Vec::len).sum(),
            emails: self.state.email_features.len(),
            user_similarity_pairs: self.state.user_similarity.pair_count(),
            item_similarity_pairs: self.state.item_similarity.pair_count(),
            recompute_count: self.recompute_count,
            last_recompute: self.last_recompute,
        }
    }
}
