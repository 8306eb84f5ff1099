use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::error::{AppError, AppResult};

/// Vocabulary cap applied on every fit
pub const MAX_FEATURES: usize = 500;

/// Words of two or more word characters, matched after lowercasing
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// TF-IDF vectorizer over email combined text
///
/// The vocabulary is learned from scratch on each `fit_transform` call.
/// Weighting uses raw term counts scaled by a smoothed inverse document
/// frequency, `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalized
/// so cosine similarity between rows reduces to a dot product.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Learned term → column index mapping (columns are in alphabetical order)
    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learns the vocabulary from `documents` and returns one dense,
    /// L2-normalized row per document
    ///
    /// Fails with `AppError::Vectorization` when there are no documents or
    /// when no document contains a single token.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<Vec<Vec<f64>>> {
        if documents.is_empty() {
            return Err(AppError::Vectorization(
                "Cannot fit on empty documents".to_string(),
            ));
        }

        let pattern =
            Regex::new(TOKEN_PATTERN).map_err(|e| AppError::Vectorization(e.to_string()))?;

        // 1. Count terms per document
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| count_terms(&pattern, doc.as_ref()))
            .collect();

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc_counts in &counts {
            for (term, count) in doc_counts {
                *corpus_freq.entry(term.as_str()).or_insert(0) += count;
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        if corpus_freq.is_empty() {
            return Err(AppError::Vectorization(
                "Empty vocabulary; documents contain no terms".to_string(),
            ));
        }

        // 2. Keep the most frequent terms, ties broken alphabetically
        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        // 3. Smoothed idf per kept term
        let n_docs = documents.len() as f64;
        self.idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        // 4. Weight and normalize
        let rows = counts
            .iter()
            .map(|doc_counts| {
                let mut row = vec![0.0; self.vocabulary.len()];
                for (term, count) in doc_counts {
                    if let Some(&idx) = self.vocabulary.get(term) {
                        row[idx] = *count as f64 * self.idf[idx];
                    }
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "TF-IDF vectorizer fitted"
        );

        Ok(rows)
    }
}

fn count_terms(pattern: &Regex, text: &str) -> HashMap<String, usize> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in pattern.find_iter(&lowered) {
        *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        row.iter_mut().for_each(|v| *v /= norm);
    }
}
