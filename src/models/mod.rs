use serde::{Deserialize, Serialize};

pub mod action;
pub mod email_features;
pub mod recommendation;

pub use action::{ActionType, UserActionRecord};
pub use email_features::EmailFeatureRecord;
pub use recommendation::{Recommendation, RecommendationRequest, RecommendationResponse};

/// Identifier of a user in the mail backend
pub type UserId = i64;

/// Identifier of an email in the mail backend
pub type EmailId = i64;

/// Free-form action metadata, echoed back but never interpreted
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Body of `POST /record-action/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActionRequest {
    pub user_id: UserId,
    pub email_id: EmailId,
    pub action_type: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Body of `POST /add-email-features/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailFeatureRequest {
    pub email_id: EmailId,
    pub subject: String,
    pub body: String,
    pub sender: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Plain acknowledgement body used by mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_request_metadata_defaults_to_empty() {
        let request: UserActionRequest =
            serde_json::from_str(r#"{"user_id": 1, "email_id": 2, "action_type": "OPEN"}"#)
                .unwrap();
        assert!(request.metadata.is_empty());
        assert_eq!(request.action_type, "OPEN");
    }

    #[test]
    fn test_feature_request_categories_default_to_empty() {
        let request: EmailFeatureRequest = serde_json::from_str(
            r#"{"email_id": 4, "subject": "s", "body": "b", "sender": "x"}"#,
        )
        .unwrap();
        assert!(request.categories.is_empty());
    }
}
