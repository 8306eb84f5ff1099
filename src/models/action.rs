use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{EmailId, Metadata};

/// Kind of interaction a user had with an email
///
/// Action types arrive as free-form strings from the web layer. Known names
/// map to a fixed variant; anything else is kept verbatim in `Other` and
/// scored with the default weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Open,
    Reply,
    Forward,
    Delete,
    MarkImportant,
    CategoryChange,
    Archive,
    Other(String),
}

impl ActionType {
    /// Weight contributed by one action of this type
    pub fn score(&self) -> f64 {
        match self {
            ActionType::Open => 1.0,
            ActionType::Reply => 3.0,
            ActionType::Forward => 2.0,
            ActionType::Delete => -1.0,
            ActionType::MarkImportant => 2.5,
            ActionType::CategoryChange => 1.5,
            ActionType::Archive => 0.5,
            ActionType::Other(_) => 1.0,
        }
    }

    /// Wire name of the action type
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Open => "OPEN",
            ActionType::Reply => "REPLY",
            ActionType::Forward => "FORWARD",
            ActionType::Delete => "DELETE",
            ActionType::MarkImportant => "MARK_IMPORTANT",
            ActionType::CategoryChange => "CATEGORY_CHANGE",
            ActionType::Archive => "ARCHIVE",
            ActionType::Other(name) => name,
        }
    }
}

impl From<&str> for ActionType {
    fn from(name: &str) -> Self {
        // Matching is case-sensitive: "open" is an unknown type.
        match name {
            "OPEN" => ActionType::Open,
            "REPLY" => ActionType::Reply,
            "FORWARD" => ActionType::Forward,
            "DELETE" => ActionType::Delete,
            "MARK_IMPORTANT" => ActionType::MarkImportant,
            "CATEGORY_CHANGE" => ActionType::CategoryChange,
            "ARCHIVE" => ActionType::Archive,
            other => ActionType::Other(other.to_string()),
        }
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        ActionType::from(name.as_str())
    }
}

impl From<ActionType> for String {
    fn from(action_type: ActionType) -> Self {
        action_type.as_str().to_string()
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded interaction of a user with an email
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserActionRecord {
    pub email_id: EmailId,
    pub action_type: ActionType,
    /// Derived from `action_type` when the record is created
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl UserActionRecord {
    /// Creates a record stamped with the current time
    pub fn new(email_id: EmailId, action_type: ActionType, metadata: Metadata) -> Self {
        let score = action_type.score();
        Self {
            email_id,
            action_type,
            score,
            metadata,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table() {
        let expected = [
            ("OPEN", 1.0),
            ("REPLY", 3.0),
            ("FORWARD", 2.0),
            ("DELETE", -1.0),
            ("MARK_IMPORTANT", 2.5),
            ("CATEGORY_CHANGE", 1.5),
            ("ARCHIVE", 0.5),
        ];

        for (name, score) in expected {
            assert_eq!(ActionType::from(name).score(), score, "score for {}", name);
        }
    }

    #[test]
    fn test_unknown_types_score_default() {
        assert_eq!(ActionType::from("SNOOZE").score(), 1.0);
        assert_eq!(ActionType::from("").score(), 1.0);
        // Lowercase known names are not recognised
        assert_eq!(ActionType::from("reply"), ActionType::Other("reply".to_string()));
        assert_eq!(ActionType::from("reply").score(), 1.0);
    }

    #[test]
    fn test_action_type_serde_keeps_wire_name() {
        let json = serde_json::to_string(&ActionType::MarkImportant).unwrap();
        assert_eq!(json, r#""MARK_IMPORTANT""#);

        let other: ActionType = serde_json::from_str(r#""SNOOZE""#).unwrap();
        assert_eq!(other, ActionType::Other("SNOOZE".to_string()));
        assert_eq!(serde_json::to_string(&other).unwrap(), r#""SNOOZE""#);
    }

    #[test]
    fn test_record_derives_score() {
        let record = UserActionRecord::new(7, ActionType::Delete, Metadata::new());
        assert_eq!(record.email_id, 7);
        assert_eq!(record.score, -1.0);
        assert!(record.metadata.is_empty());
    }
}
