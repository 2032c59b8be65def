//! The I/O boundary of the accounts client.
//!
//! # Design
//! `Transport` is the capability `AccountsClient` talks to: one method per
//! verb, each taking a server-relative path and returning the decoded JSON
//! body. `RestTransport` is the concrete implementation. It splits every call
//! into `build_request` (produces an `HttpRequest`) and `parse_response`
//! (consumes an `HttpResponse`), with the round-trip in between delegated to
//! an `HttpExecutor`. Nothing here retries, caches or times out; timeouts are
//! the executor's business.
//!
//! Paths are composed verbatim by the caller. Only characters that cannot
//! appear in a URI at all (spaces, quotes, braces, non-ASCII, ...) are
//! percent-encoded when the absolute `url` is built; `HttpRequest::path`
//! keeps the raw string.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Gerrit prepends this line to JSON bodies to defeat XSSI.
pub const JSON_MAGIC_PREFIX: &str = ")]}'";

/// Bytes that are never legal in a URI. Reserved delimiters (`/ ? & = @`) and
/// `%` pass through so composed paths and pre-encoded values keep their meaning.
const URI_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Issues requests against server-relative paths and returns raw JSON.
///
/// A body-less success (e.g. `204 No Content`) is `Value::Null`.
pub trait Transport {
    fn get_request(&self, path: &str) -> Result<Value, ApiError>;

    fn put_request(&self, path: &str) -> Result<Value, ApiError>;

    fn put_request_with_body(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    fn delete_request(&self, path: &str) -> Result<Value, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_request(&self, path: &str) -> Result<Value, ApiError> {
        (**self).get_request(path)
    }

    fn put_request(&self, path: &str) -> Result<Value, ApiError> {
        (**self).put_request(path)
    }

    fn put_request_with_body(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        (**self).put_request_with_body(path, body)
    }

    fn delete_request(&self, path: &str) -> Result<Value, ApiError> {
        (**self).delete_request(path)
    }
}

/// Performs the actual HTTP round-trip.
///
/// Implementations return non-2xx responses as data; only failures where no
/// response was received become `ApiError::Transport`.
pub trait HttpExecutor {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> HttpExecutor for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// `Transport` over HTTP against a fixed base URL.
#[derive(Debug, Clone)]
pub struct RestTransport<E> {
    base_url: String,
    user_agent: Option<String>,
    executor: E,
}

impl<E: HttpExecutor> RestTransport<E> {
    pub fn new(config: &ClientConfig, executor: E) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            base_url: config.normalized_base_url().to_string(),
            user_agent: config.user_agent.clone(),
            executor,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(agent) = &self.user_agent {
            headers.push(("user-agent".to_string(), agent.clone()));
        }
        let body = match body {
            Some(value) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                let encoded = serde_json::to_string(value)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                Some(encoded)
            }
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: format!("{}{}", self.base_url, utf8_percent_encode(path, URI_UNSAFE)),
            path: path.to_string(),
            headers,
            body,
        })
    }

    pub fn parse_response(&self, path: &str, response: HttpResponse) -> Result<Value, ApiError> {
        if response.status == 404 {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }
        if !response.is_success() {
            tracing::warn!(status = response.status, path, "request rejected");
            return Err(ApiError::Request {
                status: response.status,
                path: path.to_string(),
                body: response.body,
            });
        }
        decode_body(&response.body)
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body)?;
        tracing::debug!(%method, url = %request.url, "dispatching request");
        let response = self.executor.execute(request)?;
        tracing::debug!(%method, path, status = response.status, "received response");
        self.parse_response(path, response)
    }
}

impl<E: HttpExecutor> Transport for RestTransport<E> {
    fn get_request(&self, path: &str) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Get, path, None)
    }

    fn put_request(&self, path: &str) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Put, path, None)
    }

    fn put_request_with_body(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Put, path, Some(body))
    }

    fn delete_request(&self, path: &str) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Delete, path, None)
    }
}

/// Strip the XSSI guard and decode; an empty body is `Value::Null`.
fn decode_body(body: &str) -> Result<Value, ApiError> {
    let trimmed = body.trim_start();
    let json = trimmed.strip_prefix(JSON_MAGIC_PREFIX).unwrap_or(trimmed).trim();
    if json.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    /// Records every request and answers with a canned response.
    #[derive(Debug)]
    struct CannedExecutor {
        response: HttpResponse,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl CannedExecutor {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpExecutor for CannedExecutor {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            Ok(self.response.clone())
        }
    }

    fn transport(status: u16, body: &str) -> RestTransport<CannedExecutor> {
        RestTransport::new(
            &ClientConfig::new("http://localhost:8080/"),
            CannedExecutor::new(status, body),
        )
        .unwrap()
    }

    #[test]
    fn build_get_request_has_no_body() {
        let t = transport(200, "");
        let req = t.build_request(HttpMethod::Get, "/accounts/self", None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/accounts/self");
        assert_eq!(req.path, "/accounts/self");
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert!(req.header("content-type").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_put_request_with_body_sets_content_type() {
        let t = transport(200, "");
        let req = t
            .build_request(HttpMethod::Put, "/accounts/jdoe/name", Some(&json!({"name": "John"})))
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "John");
    }

    #[test]
    fn user_agent_is_sent_when_configured() {
        let config = ClientConfig::new("http://localhost:8080").with_user_agent("accounts-cli/0.1");
        let t = RestTransport::new(&config, CannedExecutor::new(200, "")).unwrap();
        let req = t.build_request(HttpMethod::Get, "/accounts/self", None).unwrap();
        assert_eq!(req.header("user-agent"), Some("accounts-cli/0.1"));
    }

    #[test]
    fn get_strips_magic_prefix() {
        let t = transport(200, ")]}'\n{\"_account_id\":1000000}");
        let value = t.get_request("/accounts/self").unwrap();
        assert_eq!(value, json!({"_account_id": 1000000}));

        let seen = t.executor().seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
    }

    #[test]
    fn body_without_prefix_is_accepted() {
        let t = transport(200, "[1,2]");
        assert_eq!(t.get_request("/x").unwrap(), json!([1, 2]));
    }

    #[test]
    fn no_content_is_null() {
        let t = transport(204, "");
        assert_eq!(t.put_request("/accounts/jdoe/starred.changes/I1").unwrap(), Value::Null);
        assert_eq!(t.executor().seen.borrow()[0].method, HttpMethod::Put);
    }

    #[test]
    fn delete_uses_delete_verb() {
        let t = transport(204, "");
        t.delete_request("/accounts/jdoe/starred.changes/I1").unwrap();
        let seen = t.executor().seen.borrow();
        assert_eq!(seen[0].method, HttpMethod::Delete);
        assert_eq!(seen[0].url, "http://localhost:8080/accounts/jdoe/starred.changes/I1");
    }

    #[test]
    fn not_found_carries_path() {
        let t = transport(404, "Not found: nobody");
        let err = t.get_request("/accounts/nobody").unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref path } if path == "/accounts/nobody"));
    }

    #[test]
    fn server_error_carries_status_path_and_body() {
        let t = transport(500, "internal error");
        let err = t.get_request("/accounts/self").unwrap_err();
        match err {
            ApiError::Request { status, path, body } => {
                assert_eq!(status, 500);
                assert_eq!(path, "/accounts/self");
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let t = transport(200, ")]}'\nnot json");
        let err = t.get_request("/accounts/self").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn executor_failure_propagates() {
        let executor = |_req: HttpRequest| -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        };
        let t = RestTransport::new(&ClientConfig::default(), executor).unwrap();
        let err = t.get_request("/accounts/self").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = RestTransport::new(&ClientConfig::new(""), CannedExecutor::new(200, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn url_encodes_characters_illegal_in_uri() {
        let t = transport(200, "[]");
        let req = t
            .build_request(HttpMethod::Get, "/accounts/?q=John Doe&n=5", None)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/accounts/?q=John%20Doe&n=5");
        assert_eq!(req.path, "/accounts/?q=John Doe&n=5");

        let req = t
            .build_request(HttpMethod::Get, "/accounts/?q=\"Jürgen\" name:{x}", None)
            .unwrap();
        assert_eq!(
            req.url,
            "http://localhost:8080/accounts/?q=%22J%C3%BCrgen%22%20name:%7Bx%7D"
        );
    }

    #[test]
    fn url_keeps_reserved_delimiters_and_escapes() {
        let t = transport(200, "");
        let req = t
            .build_request(HttpMethod::Put, "/accounts/jdoe/emails/j.doe+x@example.com", None)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/accounts/jdoe/emails/j.doe+x@example.com");

        let req = t
            .build_request(HttpMethod::Get, "/accounts/?q=John%20Doe", None)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/accounts/?q=John%20Doe");
    }
}
