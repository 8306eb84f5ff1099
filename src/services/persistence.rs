use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    services::engine::EngineState,
};

/// Result of a best-effort save or load
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Saved,
    Loaded,
    /// Nothing stored at the path; in-memory state untouched
    NotFound,
    /// The operation failed; in-memory state untouched
    Failed(String),
}

impl PersistenceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PersistenceOutcome::Failed(_))
    }
}

/// Serializes `state` to `path` as a single JSON document
///
/// The document is written to a sibling temporary file first and renamed
/// into place, so an interrupted save never truncates an existing model.
pub fn write_state(path: &Path, state: &EngineState) -> AppResult<()> {
    let tmp = temp_path(path);

    let result =
        write_json(&tmp, state).and_then(|()| fs::rename(&tmp, path).map_err(AppError::from));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Reads an engine state from `path`
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_state(path: &Path) -> AppResult<Option<EngineState>> {
    if !path.exists() {
        return Ok(None);
    }

    let reader = BufReader::new(File::open(path)?);
    let state = serde_json::from_reader(reader)?;
    Ok(Some(state))
}

fn write_json(path: &Path, state: &EngineState) -> AppResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, state)?;
    writer.flush()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use crate::services::engine::RecommendationEngine;

    fn trained_engine() -> RecommendationEngine {
        let mut engine = RecommendationEngine::new();
        let emails = [
            (1, "Book flight to Paris", "Booking"),
            (2, "Hotel reservation in Rome", "Booking"),
            (3, "Special offer on cruises", "Marketing"),
            (4, "Payment charged twice", "Billing"),
            (5, "Flight confirmation needed", "Booking"),
        ];
        for (email_id, subject, category) in emails {
            engine.add_email_features(
                email_id,
                subject.to_string(),
                format!("{} please", subject),
                "client@example.com".to_string(),
                vec![category.to_string()],
            );
        }

        for _ in 0..5 {
            engine.record_action(1, 1, "REPLY", Metadata::new());
            engine.record_action(1, 3, "OPEN", Metadata::new());
            engine.record_action(2, 1, "OPEN", Metadata::new());
            engine.record_action(2, 4, "MARK_IMPORTANT", Metadata::new());
            engine.record_action(3, 2, "FORWARD", Metadata::new());
            engine.record_action(3, 1, "ARCHIVE", Metadata::new());
        }
        engine
    }

    #[test]
    fn test_round_trip_reproduces_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let engine = trained_engine();

        assert_eq!(engine.save_model(&path), PersistenceOutcome::Saved);

        let mut restored = RecommendationEngine::new();
        assert_eq!(restored.load_model(&path), PersistenceOutcome::Loaded);

        assert_eq!(restored.state(), engine.state());
        for user_id in [1, 2, 3, 4] {
            assert_eq!(
                restored.get_recommendations(user_id, 5),
                engine.get_recommendations(user_id, 5)
            );
        }
    }

    #[test]
    fn test_load_replaces_state_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        trained_engine().save_model(&path);

        let mut engine = RecommendationEngine::new();
        engine.record_action(77, 500, "OPEN", Metadata::new());
        engine.load_model(&path);

        assert!(engine.actions_for(77).is_empty());
        assert_eq!(engine.actions_for(1).len(), 10);
    }

    #[test]
    fn test_missing_file_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = RecommendationEngine::new();
        engine.record_action(1, 10, "OPEN", Metadata::new());

        let outcome = engine.load_model(dir.path().join("absent.json"));
        assert_eq!(outcome, PersistenceOutcome::NotFound);
        assert_eq!(engine.actions_for(1).len(), 1);
    }

    #[test]
    fn test_corrupt_file_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"{not json").unwrap();

        let mut engine = RecommendationEngine::new();
        engine.record_action(1, 10, "OPEN", Metadata::new());

        assert!(engine.load_model(&path).is_failure());
        assert_eq!(engine.actions_for(1).len(), 1);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            br#"{"user_actions": {"5": [{"email_id": 9, "action_type": "REPLY", "score": 3.0}]}}"#,
        )
        .unwrap();

        let state = read_state(&path).unwrap().unwrap();
        assert_eq!(state.user_actions[&5][0].score, 3.0);
        assert!(state.email_features.is_empty());
        assert!(state.user_similarity.is_empty());
        assert!(state.item_similarity.is_empty());
    }

    #[test]
    fn test_save_to_unwritable_location_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("model.json");

        let outcome = RecommendationEngine::new().save_model(&path);
        assert!(outcome.is_failure());
        assert!(!path.exists());
    }

    #[test]
    fn test_save_overwrites_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        trained_engine().save_model(&path);
        RecommendationEngine::new().save_model(&path);

        let state = read_state(&path).unwrap().unwrap();
        assert!(state.user_actions.is_empty());
        assert!(!temp_path(&path).exists());
    }
}
