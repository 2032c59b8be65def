//! Decoding of raw JSON responses into account types.
//!
//! `AccountsClient` never looks inside a response body; it hands the raw
//! `serde_json::Value` to an `AccountsParser`. `JsonAccountsParser` is the
//! serde-backed implementation used in production.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::types::{AccountInfo, EmailInfo, PreferencesInfo};

pub trait AccountsParser {
    fn parse_account_info(&self, json: &Value) -> Result<AccountInfo, ApiError>;

    fn parse_account_infos(&self, json: &Value) -> Result<Vec<AccountInfo>, ApiError>;

    fn parse_email_info(&self, json: &Value) -> Result<EmailInfo, ApiError>;

    fn parse_email_infos(&self, json: &Value) -> Result<Vec<EmailInfo>, ApiError>;

    fn parse_preferences(&self, json: &Value) -> Result<PreferencesInfo, ApiError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAccountsParser;

impl JsonAccountsParser {
    pub fn new() -> Self {
        Self
    }
}

fn decode<T: DeserializeOwned>(json: &Value) -> Result<T, ApiError> {
    serde_json::from_value(json.clone()).map_err(|e| ApiError::Parse(e.to_string()))
}

impl AccountsParser for JsonAccountsParser {
    fn parse_account_info(&self, json: &Value) -> Result<AccountInfo, ApiError> {
        if !json.is_object() {
            return Err(ApiError::Parse(format!("expected account object, got {json}")));
        }
        decode(json)
    }

    fn parse_account_infos(&self, json: &Value) -> Result<Vec<AccountInfo>, ApiError> {
        // An empty suggestion list may come back as no content at all.
        if json.is_null() {
            return Ok(Vec::new());
        }
        decode(json)
    }

    fn parse_email_info(&self, json: &Value) -> Result<EmailInfo, ApiError> {
        decode(json)
    }

    fn parse_email_infos(&self, json: &Value) -> Result<Vec<EmailInfo>, ApiError> {
        if json.is_null() {
            return Ok(Vec::new());
        }
        decode(json)
    }

    fn parse_preferences(&self, json: &Value) -> Result<PreferencesInfo, ApiError> {
        if !json.is_object() {
            return Err(ApiError::Parse(format!("expected preferences object, got {json}")));
        }
        decode(json)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_single_account() {
        let info = JsonAccountsParser
            .parse_account_info(&json!({
                "_account_id": 1000096,
                "name": "John Doe",
                "email": "john.doe@example.com",
                "avatars": [{"url": "https://example.com/a.png", "height": 26}]
            }))
            .unwrap();
        assert_eq!(info.account_id, Some(1000096));
        assert_eq!(info.name.as_deref(), Some("John Doe"));
        assert_eq!(info.avatars.len(), 1);
        assert_eq!(info.avatars[0].height, Some(26));
    }

    #[test]
    fn account_must_be_an_object() {
        let err = JsonAccountsParser.parse_account_info(&Value::Null).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));

        let err = JsonAccountsParser.parse_account_info(&json!([])).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn wrong_field_type_is_a_parse_error() {
        let err = JsonAccountsParser
            .parse_account_info(&json!({"_account_id": "not a number"}))
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn parses_account_list() {
        let infos = JsonAccountsParser
            .parse_account_infos(&json!([
                {"_account_id": 1, "username": "jdoe"},
                {"_account_id": 2, "username": "jroe", "_more_accounts": true}
            ]))
            .unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].more_accounts, Some(true));
    }

    #[test]
    fn null_account_list_is_empty() {
        assert!(JsonAccountsParser.parse_account_infos(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn account_list_rejects_object() {
        let err = JsonAccountsParser
            .parse_account_infos(&json!({"_account_id": 1}))
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn parses_emails() {
        let emails = JsonAccountsParser
            .parse_email_infos(&json!([
                {"email": "john.doe@example.com", "preferred": true},
                {"email": "j.doe@example.com", "pending_confirmation": true}
            ]))
            .unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].preferred, Some(true));
        assert_eq!(emails[1].pending_confirmation, Some(true));
    }

    #[test]
    fn parses_preferences() {
        let prefs = JsonAccountsParser
            .parse_preferences(&json!({"changes_per_page": 25, "diff_view": "SIDE_BY_SIDE"}))
            .unwrap();
        assert_eq!(prefs.changes_per_page, Some(25));
        assert_eq!(prefs.diff_view.as_deref(), Some("SIDE_BY_SIDE"));
        assert!(prefs.date_format.is_none());
    }
}
