//! Account endpoints: lookup, starred changes, suggestions, names, emails
//! and preferences.
//!
//! # Design
//! `AccountsClient` owns a `Transport` and an `AccountsParser` and nothing
//! else. `id()` and `suggest_accounts()` do no I/O; they return a handle or a
//! builder that borrows the client and carries only the path it will hit.
//! Every terminal call (`get`, `star_change`, ...) is exactly one transport
//! call, and any typed result comes out of the parser. Paths are composed by
//! plain formatting; identifiers are not escaped.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::parser::{AccountsParser, JsonAccountsParser};
use crate::transport::Transport;
use crate::types::{
    AccountId, AccountInfo, ChangeId, EmailInfo, EmailInput, NameInput, PreferencesInfo,
};

#[derive(Debug, Clone)]
pub struct AccountsClient<T, P = JsonAccountsParser> {
    transport: T,
    parser: P,
}

impl<T: Transport> AccountsClient<T, JsonAccountsParser> {
    pub fn with_transport(transport: T) -> Self {
        Self::new(transport, JsonAccountsParser)
    }
}

impl<T: Transport, P: AccountsParser> AccountsClient<T, P> {
    pub fn new(transport: T, parser: P) -> Self {
        Self { transport, parser }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Handle for `/accounts/{id}`. Fails only if `id` is empty.
    pub fn id(&self, id: impl Into<String>) -> Result<AccountApi<'_, T, P>, ApiError> {
        Ok(self.account(AccountId::new(id)?))
    }

    pub fn account(&self, id: AccountId) -> AccountApi<'_, T, P> {
        AccountApi { client: self, id }
    }

    /// Handle for the calling user, `/accounts/self`.
    pub fn self_account(&self) -> AccountApi<'_, T, P> {
        self.account(AccountId::self_account())
    }

    pub fn suggest_accounts(&self, query: impl Into<String>) -> SuggestAccountsRequest<'_, T, P> {
        SuggestAccountsRequest {
            client: self,
            query: query.into(),
            params: Vec::new(),
        }
    }
}

fn to_body<S: Serialize>(input: &S) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// One account, addressed by identifier.
#[derive(Debug)]
pub struct AccountApi<'a, T, P> {
    client: &'a AccountsClient<T, P>,
    id: AccountId,
}

impl<T: Transport, P: AccountsParser> AccountApi<'_, T, P> {
    pub fn account_id(&self) -> &AccountId {
        &self.id
    }

    pub fn path(&self) -> String {
        format!("/accounts/{}", self.id)
    }

    pub fn get(&self) -> Result<AccountInfo, ApiError> {
        let json = self.client.transport.get_request(&self.path())?;
        self.client.parser.parse_account_info(&json)
    }

    pub fn star_change(&self, change_id: impl Into<String>) -> Result<(), ApiError> {
        let path = self.starred_change_path(change_id)?;
        self.client.transport.put_request(&path)?;
        Ok(())
    }

    pub fn unstar_change(&self, change_id: impl Into<String>) -> Result<(), ApiError> {
        let path = self.starred_change_path(change_id)?;
        self.client.transport.delete_request(&path)?;
        Ok(())
    }

    pub fn set_name(&self, name: impl Into<String>) -> Result<(), ApiError> {
        let body = to_body(&NameInput { name: name.into() })?;
        self.client
            .transport
            .put_request_with_body(&format!("{}/name", self.path()), &body)?;
        Ok(())
    }

    pub fn emails(&self) -> Result<Vec<EmailInfo>, ApiError> {
        let json = self.client.transport.get_request(&format!("{}/emails", self.path()))?;
        self.client.parser.parse_email_infos(&json)
    }

    pub fn add_email(&self, email: impl Into<String>) -> Result<EmailInfo, ApiError> {
        self.add_email_with(EmailInput::new(email))
    }

    /// Registers `input.email`; the address in the path and body always agree.
    pub fn add_email_with(&self, input: EmailInput) -> Result<EmailInfo, ApiError> {
        let path = self.email_path(&input.email)?;
        let body = to_body(&input)?;
        let json = self.client.transport.put_request_with_body(&path, &body)?;
        self.client.parser.parse_email_info(&json)
    }

    pub fn set_preferred_email(&self, email: &str) -> Result<(), ApiError> {
        let path = format!("{}/preferred", self.email_path(email)?);
        self.client.transport.put_request(&path)?;
        Ok(())
    }

    pub fn delete_email(&self, email: &str) -> Result<(), ApiError> {
        let path = self.email_path(email)?;
        self.client.transport.delete_request(&path)?;
        Ok(())
    }

    pub fn preferences(&self) -> Result<PreferencesInfo, ApiError> {
        let json = self
            .client
            .transport
            .get_request(&format!("{}/preferences", self.path()))?;
        self.client.parser.parse_preferences(&json)
    }

    /// Sends only the fields set in `input`; returns the resulting preferences.
    pub fn set_preferences(&self, input: &PreferencesInfo) -> Result<PreferencesInfo, ApiError> {
        let body = to_body(input)?;
        let json = self
            .client
            .transport
            .put_request_with_body(&format!("{}/preferences", self.path()), &body)?;
        self.client.parser.parse_preferences(&json)
    }

    fn starred_change_path(&self, change_id: impl Into<String>) -> Result<String, ApiError> {
        let change_id = ChangeId::new(change_id)?;
        Ok(format!("{}/starred.changes/{change_id}", self.path()))
    }

    fn email_path(&self, email: &str) -> Result<String, ApiError> {
        if email.is_empty() {
            return Err(ApiError::InvalidIdentifier("email is empty"));
        }
        Ok(format!("{}/emails/{email}", self.path()))
    }
}

/// Pending `GET /accounts/?q=...` call. Parameters are appended in call order.
#[derive(Debug)]
pub struct SuggestAccountsRequest<'a, T, P> {
    client: &'a AccountsClient<T, P>,
    query: String,
    params: Vec<(&'static str, String)>,
}

impl<T: Transport, P: AccountsParser> SuggestAccountsRequest<'_, T, P> {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.params.push(("n", limit.to_string()));
        self
    }

    pub fn path(&self) -> String {
        let mut path = format!("/accounts/?q={}", self.query);
        for (key, value) in &self.params {
            path.push('&');
            path.push_str(key);
            path.push('=');
            path.push_str(value);
        }
        path
    }

    pub fn get(&self) -> Result<Vec<AccountInfo>, ApiError> {
        let json = self.client.transport.get_request(&self.path())?;
        self.client.parser.parse_account_infos(&json)
    }
}
