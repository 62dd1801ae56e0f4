//! Session record DTOs.

use chrono::{DateTime, Utc};
use nestline_core::validation::rules;
use nestline_core::UserId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a therapy session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRecordRequest {
    pub owner_id: UserId,

    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = rules::not_blank)
    )]
    pub title: String,

    pub session_date: DateTime<Utc>,

    #[validate(length(max = 200, message = "Provider name cannot exceed 200 characters"))]
    pub provider_name: Option<String>,

    #[validate(length(min = 1, message = "Notes cannot be empty"))]
    pub notes: String,

    pub concerns: Option<String>,
}

/// Request to update a session record. Absent fields are left unchanged;
/// the nested options on `provider_name` and `concerns` distinguish
/// "leave as is" from "clear the field".
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSessionRecordRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub session_date: Option<DateTime<Utc>>,

    pub provider_name: Option<Option<String>>,

    #[validate(length(min = 1, message = "Notes cannot be empty"))]
    pub notes: Option<String>,

    pub concerns: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn create_request() -> CreateSessionRecordRequest {
        CreateSessionRecordRequest {
            owner_id: UserId::new(),
            title: "OT session week 14".to_string(),
            session_date: Utc::now(),
            provider_name: Some("Northside Pediatric OT".to_string()),
            notes: "Worked on fine motor sequencing, good engagement.".to_string(),
            concerns: None,
        }
    }

    #[test]
    fn test_create_session_record_request_valid() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_create_session_record_request_blank_title() {
        let mut request = create_request();
        request.title = " ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_session_record_request_empty_notes() {
        let mut request = create_request();
        request.notes = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_session_record_request_empty_is_valid() {
        let request = UpdateSessionRecordRequest {
            title: None,
            session_date: None,
            provider_name: None,
            notes: None,
            concerns: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_session_record_request_clearing_provider_is_valid() {
        let request = UpdateSessionRecordRequest {
            title: None,
            session_date: None,
            provider_name: Some(None),
            notes: None,
            concerns: Some(None),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_session_record_request_empty_notes() {
        let request = UpdateSessionRecordRequest {
            title: None,
            session_date: None,
            provider_name: None,
            notes: Some(String::new()),
            concerns: None,
        };
        assert!(request.validate().is_err());
    }
}
