//! In-memory stand-in for the account endpoints of a Gerrit server.
//!
//! Responses carry Gerrit's `)]}'` JSON prefix. There is no authentication:
//! `self` always resolves to the administrator account.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const JSON_MAGIC_PREFIX: &str = ")]}'";
pub const SELF_ACCOUNT_ID: i64 = 1_000_000;

#[derive(Clone, Debug)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub emails: Vec<Email>,
    pub starred_changes: BTreeSet<String>,
    pub preferences: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Email {
    pub email: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preferred: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending_confirmation: bool,
}

impl Account {
    fn new(id: i64, username: &str, name: &str, email: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            name: Some(name.to_string()),
            emails: vec![Email {
                email: email.to_string(),
                preferred: true,
                pending_confirmation: false,
            }],
            starred_changes: BTreeSet::new(),
            preferences: default_preferences(),
        }
    }

    pub fn preferred_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.preferred)
            .map(|e| e.email.as_str())
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.username.to_lowercase().contains(&query)
            || self
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&query))
            || self
                .emails
                .iter()
                .any(|e| e.email.to_lowercase().contains(&query))
    }

    fn to_info(&self) -> Value {
        let mut info = Map::new();
        info.insert("_account_id".to_string(), Value::from(self.id));
        if let Some(name) = &self.name {
            info.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(email) = self.preferred_email() {
            info.insert("email".to_string(), Value::from(email));
        }
        info.insert("username".to_string(), Value::from(self.username.as_str()));
        Value::Object(info)
    }
}

fn default_preferences() -> Map<String, Value> {
    let defaults = serde_json::json!({
        "changes_per_page": 25,
        "date_format": "STD",
        "time_format": "HHMM_12",
        "diff_view": "SIDE_BY_SIDE",
        "email_strategy": "ENABLED",
        "size_bar_in_change_table": true,
        "relative_date_in_change_table": false
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: BTreeMap<i64, Account>,
}

impl Store {
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for account in [
            Account::new(SELF_ACCOUNT_ID, "admin", "Administrator", "admin@example.com"),
            Account::new(1_000_096, "jdoe", "John Doe", "john.doe@example.com"),
            Account::new(1_000_097, "jroe", "Jane Roe", "jane.roe@example.com"),
        ] {
            store.accounts.insert(account.id, account);
        }
        store
    }

    /// Resolve `self`, a numeric id, a username or any registered email.
    pub fn resolve(&self, identifier: &str) -> Option<i64> {
        if identifier == "self" {
            return Some(SELF_ACCOUNT_ID);
        }
        if let Ok(id) = identifier.parse::<i64>() {
            return self.accounts.contains_key(&id).then_some(id);
        }
        self.accounts
            .values()
            .find(|a| a.username == identifier || a.emails.iter().any(|e| e.email == identifier))
            .map(|a| a.id)
    }

    pub fn get(&self, id: i64) -> Option<&Account> {
        self.accounts.get(&id)
    }

    fn get_mut(&mut self, id: i64) -> Option<&mut Account> {
        self.accounts.get_mut(&id)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_store(Store::seeded())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/accounts/", get(suggest_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/name", put(set_name))
        .route("/accounts/{id}/starred.changes", get(list_starred_changes))
        .route(
            "/accounts/{id}/starred.changes/{change_id}",
            put(star_change).delete(unstar_change),
        )
        .route("/accounts/{id}/emails", get(list_emails))
        .route("/accounts/{id}/emails/{email}", put(add_email).delete(delete_email))
        .route("/accounts/{id}/emails/{email}/preferred", put(set_preferred_email))
        .route("/accounts/{id}/preferences", get(get_preferences).put(set_preferences))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serialize `value` the way Gerrit does, prefix included.
fn gerrit_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
            format!("{JSON_MAGIC_PREFIX}\n{body}\n"),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Not found: {what}")).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub q: String,
    pub n: Option<usize>,
}

async fn suggest_accounts(State(db): State<Db>, Query(params): Query<SuggestParams>) -> Response {
    let store = db.read().await;
    let matching: Vec<&Account> = store
        .accounts
        .values()
        .filter(|a| a.matches(&params.q))
        .collect();
    let limit = params.n.unwrap_or(matching.len());
    let mut infos: Vec<Value> = matching.iter().take(limit).map(|a| a.to_info()).collect();
    if matching.len() > limit {
        if let Some(Value::Object(last)) = infos.last_mut() {
            last.insert("_more_accounts".to_string(), Value::Bool(true));
        }
    }
    gerrit_json(StatusCode::OK, &infos)
}

async fn get_account(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.resolve(&id).and_then(|id| store.get(id)) {
        Some(account) => gerrit_json(StatusCode::OK, &account.to_info()),
        None => not_found(&id),
    }
}

#[derive(Debug, Deserialize)]
pub struct NameInput {
    #[serde(default)]
    pub name: String,
}

async fn set_name(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<NameInput>,
) -> Response {
    let mut store = db.write().await;
    let Some(account) = store.resolve(&id).and_then(|id| store.get_mut(id)) else {
        return not_found(&id);
    };
    let name = input.name.trim();
    if name.is_empty() {
        account.name = None;
        return StatusCode::NO_CONTENT.into_response();
    }
    account.name = Some(name.to_string());
    gerrit_json(StatusCode::OK, &name)
}

async fn list_starred_changes(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.resolve(&id).and_then(|id| store.get(id)) {
        Some(account) => {
            let changes: Vec<Value> = account
                .starred_changes
                .iter()
                .map(|c| serde_json::json!({ "change_id": c }))
                .collect();
            gerrit_json(StatusCode::OK, &changes)
        }
        None => not_found(&id),
    }
}

async fn star_change(
    State(db): State<Db>,
    Path((id, change_id)): Path<(String, String)>,
) -> Response {
    let mut store = db.write().await;
    match store.resolve(&id).and_then(|id| store.get_mut(id)) {
        Some(account) => {
            account.starred_changes.insert(change_id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(&id),
    }
}

async fn unstar_change(
    State(db): State<Db>,
    Path((id, change_id)): Path<(String, String)>,
) -> Response {
    let mut store = db.write().await;
    match store.resolve(&id).and_then(|id| store.get_mut(id)) {
        Some(account) => {
            account.starred_changes.remove(&change_id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(&id),
    }
}

async fn list_emails(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.resolve(&id).and_then(|id| store.get(id)) {
        Some(account) => gerrit_json(StatusCode::OK, &account.emails),
        None => not_found(&id),
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub email: Option<String>,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub no_confirmation: bool,
}

async fn add_email(
    State(db): State<Db>,
    Path((id, email)): Path<(String, String)>,
    Json(input): Json<EmailInput>,
) -> Response {
    if input.email.as_deref().is_some_and(|e| e != email) {
        return (StatusCode::BAD_REQUEST, "email address must match URL").into_response();
    }
    let mut store = db.write().await;
    let Some(account) = store.resolve(&id).and_then(|id| store.get_mut(id)) else {
        return not_found(&id);
    };
    if account.emails.iter().any(|e| e.email == email) {
        return (StatusCode::CONFLICT, format!("email {email} already registered")).into_response();
    }
    if input.preferred {
        for existing in &mut account.emails {
            existing.preferred = false;
        }
    }
    let added = Email {
        email,
        preferred: input.preferred,
        pending_confirmation: !input.no_confirmation,
    };
    account.emails.push(added.clone());
    gerrit_json(StatusCode::CREATED, &added)
}

async fn delete_email(
    State(db): State<Db>,
    Path((id, email)): Path<(String, String)>,
) -> Response {
    let mut store = db.write().await;
    let Some(account) = store.resolve(&id).and_then(|id| store.get_mut(id)) else {
        return not_found(&id);
    };
    let before = account.emails.len();
    account.emails.retain(|e| e.email != email);
    if account.emails.len() == before {
        return not_found(&email);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn set_preferred_email(
    State(db): State<Db>,
    Path((id, email)): Path<(String, String)>,
) -> Response {
    let mut store = db.write().await;
    let Some(account) = store.resolve(&id).and_then(|id| store.get_mut(id)) else {
        return not_found(&id);
    };
    if !account.emails.iter().any(|e| e.email == email) {
        return not_found(&email);
    }
    if account.preferred_email() == Some(email.as_str()) {
        return StatusCode::NO_CONTENT.into_response();
    }
    for existing in &mut account.emails {
        existing.preferred = existing.email == email;
    }
    gerrit_json(StatusCode::OK, &Value::Null)
}

async fn get_preferences(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.resolve(&id).and_then(|id| store.get(id)) {
        Some(account) => gerrit_json(StatusCode::OK, &account.preferences),
        None => not_found(&id),
    }
}

async fn set_preferences(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    let mut store = db.write().await;
    let Some(account) = store.resolve(&id).and_then(|id| store.get_mut(id)) else {
        return not_found(&id);
    };
    for (key, value) in input {
        if !value.is_null() {
            account.preferences.insert(key, value);
        }
    }
    gerrit_json(StatusCode::OK, &account.preferences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_resolves_every_identifier_kind() {
        let store = Store::seeded();
        assert_eq!(store.resolve("self"), Some(SELF_ACCOUNT_ID));
        assert_eq!(store.resolve("1000096"), Some(1_000_096));
        assert_eq!(store.resolve("jdoe"), Some(1_000_096));
        assert_eq!(store.resolve("jane.roe@example.com"), Some(1_000_097));
        assert_eq!(store.resolve("999"), None);
        assert_eq!(store.resolve("nobody"), None);
    }

    #[test]
    fn account_info_uses_gerrit_field_names() {
        let store = Store::seeded();
        let info = store.get(1_000_096).unwrap().to_info();
        assert_eq!(info["_account_id"], 1_000_096);
        assert_eq!(info["name"], "John Doe");
        assert_eq!(info["email"], "john.doe@example.com");
        assert_eq!(info["username"], "jdoe");
    }

    #[test]
    fn query_matches_username_name_and_email_case_insensitively() {
        let store = Store::seeded();
        let account = store.get(1_000_096).unwrap();
        assert!(account.matches("JDOE"));
        assert!(account.matches("john"));
        assert!(account.matches("example.com"));
        assert!(!account.matches("roe"));
    }

    #[test]
    fn email_flags_are_omitted_when_false() {
        let email = Email {
            email: "a@example.com".to_string(),
            preferred: false,
            pending_confirmation: false,
        };
        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json, serde_json::json!({"email": "a@example.com"}));
    }

    #[test]
    fn email_input_defaults_flags() {
        let input: EmailInput = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        assert_eq!(input.email.as_deref(), Some("a@example.com"));
        assert!(!input.preferred);
        assert!(!input.no_confirmation);
    }
}
