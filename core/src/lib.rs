//! Synchronous client for the accounts part of Gerrit's REST API.
//!
//! # Overview
//! `AccountsClient` turns method calls into `(verb, path)` pairs, sends them
//! through a `Transport` and hands the JSON it gets back to an
//! `AccountsParser`. The provided `RestTransport` builds plain-data
//! `HttpRequest`s and lets an `HttpExecutor` do the actual round-trip
//! (`UreqExecutor` with the default `ureq` feature).
//!
//! # Design
//! - `AccountsClient` holds only its transport and parser; no caching, no
//!   retries, no locks.
//! - Handles (`AccountApi`) and builders (`SuggestAccountsRequest`) do no I/O
//!   until a terminal call, and each terminal call is one request.
//! - `Transport`, `AccountsParser` and `HttpExecutor` are traits so tests can
//!   substitute recording fakes at every seam.
//!
//! ```no_run
//! use gerrit_core::{AccountsClient, ClientConfig, RestTransport, UreqExecutor};
//!
//! # fn main() -> Result<(), gerrit_core::ApiError> {
//! let config = ClientConfig::new("https://review.example.org");
//! let transport = RestTransport::new(&config, UreqExecutor::new(&config))?;
//! let accounts = AccountsClient::with_transport(transport);
//!
//! let me = accounts.self_account().get()?;
//! accounts.id("jdoe")?.star_change("Iccf90a8284f8371a211db9a2824d0617e95a79f9")?;
//! let matches = accounts.suggest_accounts("jdoe").with_limit(5).get()?;
//! # let _ = (me, matches);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod config;
pub mod error;
pub mod http;
pub mod parser;
pub mod transport;
pub mod types;
#[cfg(feature = "ureq")]
pub mod ureq_executor;

pub use accounts::{AccountApi, AccountsClient, SuggestAccountsRequest};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use parser::{AccountsParser, JsonAccountsParser};
pub use transport::{HttpExecutor, RestTransport, Transport};
pub use types::{
    AccountId, AccountInfo, AvatarInfo, ChangeId, EmailInfo, EmailInput, NameInput, PreferencesInfo,
};
#[cfg(feature = "ureq")]
pub use ureq_executor::UreqExecutor;
