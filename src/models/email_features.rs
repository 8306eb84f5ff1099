use serde::{Deserialize, Serialize};

use super::EmailId;

/// Content descriptor used for content-based filtering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailFeatureRecord {
    pub email_id: EmailId,
    pub subject: String,
    pub body: String,
    pub sender: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Subject, body, sender and categories joined by single spaces
    pub text: String,
}

impl EmailFeatureRecord {
    pub fn new(
        email_id: EmailId,
        subject: String,
        body: String,
        sender: String,
        categories: Vec<String>,
    ) -> Self {
        let text = format!("{} {} {} {}", subject, body, sender, categories.join(" "));
        Self {
            email_id,
            subject,
            body,
            sender,
            categories,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_order() {
        let record = EmailFeatureRecord::new(
            1,
            "Flight to Paris".to_string(),
            "Please book".to_string(),
            "ana@example.com".to_string(),
            vec!["Booking".to_string(), "Inquiry".to_string()],
        );
        assert_eq!(
            record.text,
            "Flight to Paris Please book ana@example.com Booking Inquiry"
        );
    }

    #[test]
    fn test_combined_text_without_categories_keeps_trailing_space() {
        let record = EmailFeatureRecord::new(
            2,
            "Hi".to_string(),
            "there".to_string(),
            "bob".to_string(),
            Vec::new(),
        );
        assert_eq!(record.text, "Hi there bob ");
    }
}
