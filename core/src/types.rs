//! Domain types for the accounts endpoints.
//!
//! # Design
//! Field names follow Gerrit's JSON wire names (`_account_id`,
//! `_more_accounts`, snake_case elsewhere). Every response field is optional
//! because Gerrit omits what it does not know or what the caller may not see.
//! Response types are only ever produced by an `AccountsParser`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Selects an account: username, email, numeric id, or `self`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub const SELF: &'static str = "self";

    pub fn new(id: impl Into<String>) -> Result<Self, ApiError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ApiError::InvalidIdentifier("account identifier is empty"));
        }
        Ok(Self(id))
    }

    pub fn self_account() -> Self {
        Self(Self::SELF.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects a change, e.g. its `I...` Change-Id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeId(String);

impl ChangeId {
    pub fn new(id: impl Into<String>) -> Result<Self, ApiError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ApiError::InvalidIdentifier("change identifier is empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_emails: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub avatars: Vec<AvatarInfo>,
    /// Set on the last entry of a truncated suggestion list.
    #[serde(rename = "_more_accounts", default, skip_serializing_if = "Option::is_none")]
    pub more_accounts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInfo {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_confirmation: Option<bool>,
}

/// Request payload for registering a new email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInput {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_confirmation: Option<bool>,
}

impl EmailInput {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            preferred: None,
            no_confirmation: None,
        }
    }
}

/// Request payload for changing the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameInput {
    pub name: String,
}

/// General preferences of an account.
///
/// Also used as the update payload: only the fields that are `Some` are sent,
/// everything else stays unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bar_in_change_table: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_date_in_change_table: Option<bool>,
}
