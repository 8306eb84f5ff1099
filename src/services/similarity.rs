use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::AppResult,
    models::{EmailFeatureRecord, EmailId, UserActionRecord, UserId},
    services::tfidf::TfidfVectorizer,
};

/// Pairwise similarity scores keyed by the first and second member of a pair
///
/// Self pairs are never stored. Values written through `insert_pair` are
/// mirrored, so `get(a, b) == get(b, a)` holds for every stored pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityMatrix<K: Ord> {
    rows: BTreeMap<K, BTreeMap<K, f64>>,
}

impl<K: Ord> Default for SimilarityMatrix<K> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> SimilarityMatrix<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the matrix from one feature row per id
    ///
    /// Every id gets an entry, even when it has no neighbors.
    pub fn from_rows(ids: &[K], rows: &[Vec<f64>]) -> Self {
        let mut matrix = Self::new();
        for id in ids {
            matrix.rows.entry(*id).or_default();
        }

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let value = cosine_similarity(&rows[i], &rows[j]);
                matrix.insert_pair(ids[i], ids[j], value);
            }
        }

        matrix
    }

    /// Stores `value` for both (a, b) and (b, a); self pairs are ignored
    pub fn insert_pair(&mut self, a: K, b: K, value: f64) {
        if a == b {
            return;
        }
        self.rows.entry(a).or_default().insert(b, value);
        self.rows.entry(b).or_default().insert(a, value);
    }

    pub fn get(&self, a: &K, b: &K) -> Option<f64> {
        self.rows.get(a).and_then(|row| row.get(b)).copied()
    }

    /// All stored neighbors of `id`, or `None` when `id` was not part of the
    /// last recompute
    pub fn neighbors(&self, id: &K) -> Option<&BTreeMap<K, f64>> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.rows.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of stored ordered pairs
    pub fn pair_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &BTreeMap<K, f64>)> {
        self.rows.iter()
    }
}

/// Cosine of the angle between `a` and `b`
///
/// A zero vector is treated as dissimilar to everything and yields 0. The
/// result is clamped to [-1, 1] to absorb rounding on parallel vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// User-user similarity over interaction-weighted vectors
///
/// Rows are users, columns every email referenced by any action; a cell is
/// the sum of the user's scores on that email. Returns `None` when fewer
/// than two users have recorded actions.
pub fn compute_user_similarity(
    user_actions: &BTreeMap<UserId, Vec<UserActionRecord>>,
) -> Option<SimilarityMatrix<UserId>> {
    if user_actions.len() < 2 {
        return None;
    }

    let users: Vec<UserId> = user_actions.keys().copied().collect();
    let emails: BTreeSet<EmailId> = user_actions
        .values()
        .flat_map(|actions| actions.iter().map(|action| action.email_id))
        .collect();
    let column: BTreeMap<EmailId, usize> = emails
        .iter()
        .enumerate()
        .map(|(idx, email_id)| (*email_id, idx))
        .collect();

    let rows: Vec<Vec<f64>> = users
        .iter()
        .map(|user_id| {
            let mut row = vec![0.0; column.len()];
            for action in &user_actions[user_id] {
                row[column[&action.email_id]] += action.score;
            }
            row
        })
        .collect();

    tracing::debug!(
        users = users.len(),
        emails = column.len(),
        "Computing user similarity"
    );

    Some(SimilarityMatrix::from_rows(&users, &rows))
}

/// Item-item similarity from TF-IDF vectors of the combined email text
///
/// Returns `Ok(None)` when no email features are stored. Vectorizer
/// failures are returned to the caller.
pub fn compute_item_similarity(
    email_features: &BTreeMap<EmailId, EmailFeatureRecord>,
) -> AppResult<Option<SimilarityMatrix<EmailId>>> {
    if email_features.is_empty() {
        return Ok(None);
    }

    let email_ids: Vec<EmailId> = email_features.keys().copied().collect();
    let texts: Vec<&str> = email_features
        .values()
        .map(|features| features.text.as_str())
        .collect();

    let mut vectorizer = TfidfVectorizer::default();
    let rows = vectorizer.fit_transform(&texts)?;

    tracing::debug!(
        emails = email_ids.len(),
        vocabulary = vectorizer.vocabulary_size(),
        "Computing item similarity"
    );

    Ok(Some(SimilarityMatrix::from_rows(&email_ids, &rows)))
}
